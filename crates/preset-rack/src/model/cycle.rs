//! Cycle navigation within the active group.
//!
//! Next/previous wrap around the active group's sequence. With no active
//! preset (or one that is not in the active group) the first or last item
//! is chosen as the entry point; an empty or missing active group yields
//! `None` and the caller no-ops.

use crate::model::rack::RackModel;
use crate::registry::PresetId;

/// The preset after `active` in the active group, wrapping at the end.
pub fn next(model: &RackModel, active: Option<&PresetId>) -> Option<PresetId> {
    let items = active_items(model)?;
    match position_of(items, active) {
        Some(pos) => Some(items[(pos + 1) % items.len()].clone()),
        None => items.first().cloned(),
    }
}

/// The preset before `active` in the active group, wrapping at the start.
pub fn previous(model: &RackModel, active: Option<&PresetId>) -> Option<PresetId> {
    let items = active_items(model)?;
    match position_of(items, active) {
        Some(pos) => Some(items[(pos + items.len() - 1) % items.len()].clone()),
        None => items.last().cloned(),
    }
}

fn active_items(model: &RackModel) -> Option<&[PresetId]> {
    let items = model.items(model.active_group()?)?;
    if items.is_empty() { None } else { Some(items) }
}

fn position_of(items: &[PresetId], active: Option<&PresetId>) -> Option<usize> {
    active.and_then(|a| items.iter().position(|i| i == a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PresetId {
        PresetId::from(s)
    }

    fn model_with_three() -> RackModel {
        let mut model = RackModel::new();
        let g = model.add_group("A");
        for name in ["a", "b", "c"] {
            model.add_item(g, id(name)).unwrap();
        }
        model
    }

    #[test]
    fn test_next_wraps_to_first() {
        let model = model_with_three();
        assert_eq!(next(&model, Some(&id("c"))), Some(id("a")));
        assert_eq!(next(&model, Some(&id("a"))), Some(id("b")));
    }

    #[test]
    fn test_previous_wraps_to_last() {
        let model = model_with_three();
        assert_eq!(previous(&model, Some(&id("a"))), Some(id("c")));
        assert_eq!(previous(&model, Some(&id("c"))), Some(id("b")));
    }

    #[test]
    fn test_no_active_item_selects_boundary() {
        let model = model_with_three();
        assert_eq!(next(&model, None), Some(id("a")));
        assert_eq!(previous(&model, None), Some(id("c")));
    }

    #[test]
    fn test_active_item_outside_group_selects_boundary() {
        let mut model = model_with_three();
        let other = model.add_group("B");
        model.add_item(other, id("elsewhere")).unwrap();

        assert_eq!(next(&model, Some(&id("elsewhere"))), Some(id("a")));
    }

    #[test]
    fn test_empty_active_group_is_noop() {
        let mut model = RackModel::new();
        model.add_group("Empty");
        assert_eq!(next(&model, None), None);
        assert_eq!(previous(&model, None), None);
    }

    #[test]
    fn test_no_groups_is_noop() {
        let model = RackModel::new();
        assert_eq!(next(&model, None), None);
    }
}
