//! Static icon table.
//!
//! Views never look icons up by arbitrary strings: tags coming from data are
//! first resolved to an [`IconKey`], and every key has a fixed entry.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::types::{DeviceKind, ModuleCategory};

/// Rendering capability for a tag: glyph plus a named color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icon {
    pub glyph: &'static str,
    pub color: &'static str,
}

/// Closed set of things that have icons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKey {
    Device(DeviceKind),
    Module(ModuleCategory),
    Overview,
    Devices,
    Marketplace,
    Subscriptions,
    Access,
    PermissionGroup(PermissionGroup),
}

/// Groups used to organize permissions in the access view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionGroup {
    Devices,
    Modules,
    Billing,
    Users,
    Organization,
}

/// Fallback for tags that do not resolve
pub const UNKNOWN_ICON: Icon = Icon {
    glyph: "?",
    color: "gray",
};

static ICONS: Lazy<HashMap<IconKey, Icon>> = Lazy::new(|| {
    use IconKey as K;
    let entries = [
        (K::Device(DeviceKind::Temperature), Icon { glyph: "🌡", color: "red" }),
        (K::Device(DeviceKind::Humidity), Icon { glyph: "💧", color: "blue" }),
        (K::Device(DeviceKind::Motion), Icon { glyph: "◉", color: "magenta" }),
        (K::Device(DeviceKind::Pressure), Icon { glyph: "◎", color: "cyan" }),
        (K::Device(DeviceKind::AirQuality), Icon { glyph: "☁", color: "green" }),
        (K::Device(DeviceKind::Gateway), Icon { glyph: "⇄", color: "yellow" }),
        (K::Module(ModuleCategory::Analytics), Icon { glyph: "▤", color: "cyan" }),
        (K::Module(ModuleCategory::Alerts), Icon { glyph: "⚠", color: "yellow" }),
        (K::Module(ModuleCategory::Integration), Icon { glyph: "⚙", color: "blue" }),
        (K::Module(ModuleCategory::Automation), Icon { glyph: "↻", color: "green" }),
        (K::Module(ModuleCategory::Security), Icon { glyph: "⛨", color: "red" }),
        (K::Overview, Icon { glyph: "⌂", color: "white" }),
        (K::Devices, Icon { glyph: "▣", color: "cyan" }),
        (K::Marketplace, Icon { glyph: "◈", color: "magenta" }),
        (K::Subscriptions, Icon { glyph: "$", color: "green" }),
        (K::Access, Icon { glyph: "⚿", color: "yellow" }),
        (K::PermissionGroup(PermissionGroup::Devices), Icon { glyph: "▣", color: "cyan" }),
        (K::PermissionGroup(PermissionGroup::Modules), Icon { glyph: "◈", color: "magenta" }),
        (K::PermissionGroup(PermissionGroup::Billing), Icon { glyph: "$", color: "green" }),
        (K::PermissionGroup(PermissionGroup::Users), Icon { glyph: "☺", color: "blue" }),
        (K::PermissionGroup(PermissionGroup::Organization), Icon { glyph: "⌂", color: "white" }),
    ];
    entries.into_iter().collect()
});

impl IconKey {
    /// Resolve a string tag from data ("gateway", "alerts", "billing")
    pub fn from_key(key: &str) -> Option<IconKey> {
        if let Some(kind) = DeviceKind::from_key(key) {
            return Some(IconKey::Device(kind));
        }
        if let Some(category) = ModuleCategory::from_key(key) {
            return Some(IconKey::Module(category));
        }
        let group = match key.trim().to_ascii_lowercase().as_str() {
            "devices" => PermissionGroup::Devices,
            "modules" => PermissionGroup::Modules,
            "billing" => PermissionGroup::Billing,
            "users" => PermissionGroup::Users,
            "organization" => PermissionGroup::Organization,
            _ => return None,
        };
        Some(IconKey::PermissionGroup(group))
    }
}

/// Icon for a key
pub fn icon(key: IconKey) -> Icon {
    ICONS.get(&key).copied().unwrap_or(UNKNOWN_ICON)
}

/// Icon for a string tag, falling back to [`UNKNOWN_ICON`]
pub fn icon_for_tag(tag: &str) -> Icon {
    IconKey::from_key(tag).map(icon).unwrap_or(UNKNOWN_ICON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_device_kind_has_an_icon() {
        for kind in DeviceKind::all() {
            assert_ne!(icon(IconKey::Device(*kind)), UNKNOWN_ICON);
        }
    }

    #[test]
    fn test_every_module_category_has_an_icon() {
        for category in ModuleCategory::all() {
            assert_ne!(icon(IconKey::Module(*category)), UNKNOWN_ICON);
        }
    }

    #[test]
    fn test_string_tags_resolve_through_the_closed_set() {
        assert_eq!(icon_for_tag("gateway").glyph, "⇄");
        assert_eq!(icon_for_tag("billing").color, "green");
        assert_eq!(icon_for_tag("not-a-tag"), UNKNOWN_ICON);
    }
}
