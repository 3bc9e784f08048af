use std::ops::AddAssign;

use tracing::trace;
use vcatalog_core::OverrideTarget;

/// Per-property tally of one or more revert applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevertStats {
    /// Overrides actually removed.
    pub cleared: usize,
    /// Mutable properties that had no override to remove.
    pub unchanged: usize,
    /// Read-only or unknown on the target.
    pub skipped: usize,
}

impl RevertStats {
    pub fn attempted(&self) -> usize {
        self.cleared + self.unchanged + self.skipped
    }
}

impl AddAssign for RevertStats {
    fn add_assign(&mut self, other: Self) {
        self.cleared += other.cleared;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
    }
}

/// Clears the local override of every named property the target allows to change.
pub fn clear_overrides<T: OverrideTarget + ?Sized>(properties: &[String], target: &mut T) -> RevertStats {
    let mut stats = RevertStats::default();
    for name in properties {
        if !target.is_property_mutable(name) {
            trace!(property = %name, "skipping read-only or unknown property");
            stats.skipped += 1;
            continue;
        }
        if target.clear_override(name) {
            stats.cleared += 1;
        } else {
            stats.unchanged += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcatalog_core::{FieldValue, ItemId, PropertyCell, Variant};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn variant() -> Variant {
        Variant::new(ItemId::new(), "V-1")
            .with_property("Size", PropertyCell::overridden("M", "L"))
            .with_property("cy_list_price", PropertyCell::overridden(10.0, 8.5).read_only())
            .with_property("DisplayName", PropertyCell::inherited("Medium"))
    }

    #[test]
    fn clears_only_mutable_overrides() {
        let mut v = variant();
        let stats = clear_overrides(&names(&["Size", "cy_list_price", "DisplayName"]), &mut v);
        assert_eq!(stats, RevertStats { cleared: 1, unchanged: 1, skipped: 1 });
        assert_eq!(v.effective("Size"), Some(&FieldValue::from("M")));
        assert_eq!(v.effective("cy_list_price"), Some(&FieldValue::Float(8.5)));
    }

    #[test]
    fn unknown_names_are_skipped() {
        let mut v = variant();
        let before = v.clone();
        let stats = clear_overrides(&names(&["Nope", "AlsoNope"]), &mut v);
        assert_eq!(stats.skipped, 2);
        assert_eq!(v, before);
    }

    #[test]
    fn second_application_changes_nothing() {
        let mut v = variant();
        let props = names(&["Size", "cy_list_price", "DisplayName"]);
        clear_overrides(&props, &mut v);
        let once = v.clone();
        let stats = clear_overrides(&props, &mut v);
        assert_eq!(v, once);
        assert_eq!(stats.cleared, 0);
        assert_eq!(stats.attempted(), 3);
    }

    #[test]
    fn stats_accumulate() {
        let mut total = RevertStats::default();
        total += RevertStats { cleared: 2, unchanged: 1, skipped: 0 };
        total += RevertStats { cleared: 1, unchanged: 0, skipped: 4 };
        assert_eq!(total, RevertStats { cleared: 3, unchanged: 1, skipped: 4 });
    }
}
