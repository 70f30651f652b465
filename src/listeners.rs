//! Listener fan-out selection.
//!
//! The create rule is intentionally asymmetric: a listener with
//! `notify_on_all = true` still gets skipped on creation if it explicitly
//! sets `notify_of_new = false`.

use crate::types::Listener;

/// Selects the listener ids that should be notified of a newly created
/// resource of `resource_type`.
pub fn select_for_create(listeners: &[Listener], resource_type: &str) -> Vec<String> {
    listeners
        .iter()
        .filter(|l| l.listen_on_type == resource_type)
        .filter(|l| {
            let notify_of_new = l.notify_of_new;
            notify_of_new == Some(true) || (l.notify_on_all && notify_of_new != Some(false))
        })
        .map(|l| l.id.clone())
        .collect()
}

/// Selects the listener ids that should be notified of an updated or deleted
/// resource of `resource_type` with id `resource_id`.
pub fn select_for_update_or_delete(
    listeners: &[Listener],
    resource_type: &str,
    resource_id: &str,
) -> Vec<String> {
    listeners
        .iter()
        .filter(|l| l.listen_on_type == resource_type)
        .filter(|l| l.notify_on_all || l.listen_on.iter().any(|id| id == resource_id))
        .map(|l| l.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener(id: &str, notify_of_new: Option<bool>, notify_on_all: bool, listen_on: Vec<&str>) -> Listener {
        Listener {
            id: id.to_string(),
            revision: "rev".to_string(),
            listen_on_type: "person".to_string(),
            notify_of_new,
            notify_on_all,
            listen_on: listen_on.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn create_fans_out_on_notify_of_new() {
        let listeners = vec![listener("l1", Some(true), false, vec![])];
        assert_eq!(select_for_create(&listeners, "person"), vec!["l1"]);
    }

    #[test]
    fn create_fans_out_on_notify_all_when_new_unset() {
        let listeners = vec![listener("l1", None, true, vec![])];
        assert_eq!(select_for_create(&listeners, "person"), vec!["l1"]);
    }

    #[test]
    fn create_suppressed_when_notify_of_new_explicitly_false() {
        let listeners = vec![listener("l1", Some(false), true, vec![])];
        assert!(select_for_create(&listeners, "person").is_empty());
    }

    #[test]
    fn update_fans_out_on_listen_on_membership() {
        let listeners = vec![listener("l1", None, false, vec!["r1"])];
        assert_eq!(
            select_for_update_or_delete(&listeners, "person", "r1"),
            vec!["l1"]
        );
        assert!(select_for_update_or_delete(&listeners, "person", "r2").is_empty());
    }

    #[test]
    fn update_fans_out_on_notify_all() {
        let listeners = vec![listener("l1", None, true, vec![])];
        assert_eq!(
            select_for_update_or_delete(&listeners, "person", "anything"),
            vec!["l1"]
        );
    }
}
