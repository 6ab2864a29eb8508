//! Which group answers a probe.
use crate::data::Snapshot;

/// Resolve the group index for a probe.
///
/// An explicit group id wins, then the virtual-host map (only when routing
/// is enabled), then the active group. Unknown ids fall through to the next
/// rule.
#[must_use]
pub fn resolve_group(
    snapshot: &Snapshot,
    explicit: Option<&str>,
    virtual_host: Option<&str>,
) -> usize {
    if let Some(index) = explicit.and_then(|id| snapshot.group_index(id)) {
        return index;
    }
    if snapshot.settings.routing.enabled
        && let Some(host) = virtual_host.map(normalize_host)
        && let Some(group_id) = snapshot.settings.routing.host_map.get(&host)
        && let Some(index) = snapshot.group_index(group_id)
    {
        return index;
    }
    snapshot
        .group_index(&snapshot.settings.active_group)
        .unwrap_or(0)
}

/// Lower-case a host and strip its port and trailing dot.
#[must_use]
pub fn normalize_host(raw: &str) -> String {
    let host = raw.trim();
    let host = if host.starts_with('[') {
        host.split_once(']').map_or(host, |(inside, _)| inside.trim_start_matches('['))
    } else {
        host.rsplit_once(':').map_or(host, |(name, _)| name)
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}
