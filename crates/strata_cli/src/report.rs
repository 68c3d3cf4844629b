//! Human-readable output

use std::fmt::Write;

use strata_platform::{PlatformRegistry, PlatformSnapshot};

pub fn snapshot(snapshot: &PlatformSnapshot) -> String {
    let mut out = String::new();

    if snapshot.platforms.is_empty() {
        out.push_str("platforms: (none)\n");
    } else {
        let _ = writeln!(out, "platforms: {}", snapshot.platforms.join(" > "));
    }
    if let Some(engine) = &snapshot.engine {
        let _ = writeln!(out, "engine:    {engine}");
    }

    if !snapshot.versions.is_empty() {
        out.push_str("versions:\n");
        for (name, version) in &snapshot.versions {
            let _ = writeln!(out, "  {name:<14} {}", version.str);
        }
    }

    if !snapshot.settings.is_empty() {
        out.push_str("settings:\n");
        for (key, value) in &snapshot.settings {
            let _ = writeln!(out, "  {key:<18} {value}");
        }
    }
    out
}

pub fn registry(registry: &PlatformRegistry) -> String {
    let mut out = String::new();

    for descriptor in registry.all() {
        let mut flags = Vec::new();
        if registry.default_name() == Some(descriptor.name()) {
            flags.push("default".to_string());
        }
        if descriptor.is_engine() {
            flags.push("engine".to_string());
        }
        if let Some(superset) = descriptor.superset() {
            flags.push(format!("superset {superset}"));
        }
        if !descriptor.subsets().is_empty() {
            flags.push(format!("-> {}", descriptor.subsets().join(", ")));
        }

        if flags.is_empty() {
            let _ = writeln!(out, "{}", descriptor.name());
        } else {
            let _ = writeln!(out, "{:<14} {}", descriptor.name(), flags.join("; "));
        }
    }
    out
}
