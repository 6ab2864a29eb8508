use rayon::prelude::*;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use motd_engine::{
    Dialect, HostAdapter, HostCapabilities, MotdEngine, MotdPayload, Probe, SelectionReason,
};

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub probes: usize,
    pub origins: usize,
    pub step_ms: u64,
    pub hosts: Vec<String>,
    pub online: u32,
    pub max: u32,
    pub plain_host: bool,
    pub start_ms: u64,
}

/// Capabilities of the simulated server host.
#[derive(Debug, Clone, Copy)]
struct SimulatedHost {
    plain: bool,
}

impl HostCapabilities for SimulatedHost {
    fn supports_rich_text(&self) -> bool {
        !self.plain
    }

    fn supports_hide_player_count(&self) -> bool {
        !self.plain
    }

    fn supports_disable_hover(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeRecord {
    pub origin: String,
    pub group_id: String,
    pub variant_id: String,
    pub reason: SelectionReason,
    pub dialect: Dialect,
    pub fallback_used: bool,
    pub frame: usize,
    pub online: u32,
    pub max: u32,
    pub rich_payload: bool,
    pub first_line: String,
}

pub fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

fn origin_for(index: usize, origins: usize) -> String {
    let slot = index % origins;
    format!("198.51.{}.{}", slot / 256 % 256, slot % 256)
}

/// Fire every probe of `plan` through the engine in parallel.
pub fn run_simulation(engine: &MotdEngine, plan: &SimulationPlan) -> Vec<ProbeRecord> {
    let adapter = HostAdapter::new();
    let host = SimulatedHost {
        plain: plan.plain_host,
    };

    (0..plan.probes)
        .into_par_iter()
        .map(|index| {
            let origin = origin_for(index, plan.origins);
            let offset = u64::try_from(index).unwrap_or(u64::MAX);
            let now_ms = plan
                .start_ms
                .saturating_add(offset.saturating_mul(plan.step_ms));
            let mut probe = Probe::new(plan.online, plan.max).with_origin(&origin);
            if !plan.hosts.is_empty() {
                probe = probe.with_virtual_host(&plan.hosts[index % plan.hosts.len()]);
            }

            let result = engine.render_for_request(&probe, now_ms, true);
            let directives = adapter.apply(&result, &host);
            log::debug!(
                "probe {index} | {origin} -> {}/{} ({:?})",
                result.group_id,
                result.variant_id,
                result.reason
            );

            ProbeRecord {
                group_id: result.group_id,
                variant_id: result.variant_id,
                reason: result.reason,
                dialect: result.dialect,
                fallback_used: result.fallback_used,
                frame: result.frame.index(),
                online: directives.online,
                max: directives.max,
                rich_payload: matches!(directives.motd, MotdPayload::Rich(_)),
                first_line: result.lines.first().cloned().unwrap_or_default(),
                origin,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use motd_engine::JsonSource;

    fn plan(probes: usize, hosts: Vec<String>) -> SimulationPlan {
        SimulationPlan {
            probes,
            origins: 8,
            step_ms: 10,
            hosts,
            online: 10,
            max: 50,
            plain_host: true,
            start_ms: 1_000_000,
        }
    }

    fn engine() -> MotdEngine {
        let engine = MotdEngine::default();
        engine
            .reload_from(&JsonSource::new(include_str!("../assets/sample.json")))
            .expect("sample parses");
        engine
    }

    #[test]
    fn origins_cycle() {
        assert_eq!(origin_for(0, 3), "198.51.0.0");
        assert_eq!(origin_for(4, 3), "198.51.0.1");
        assert_eq!(origin_for(300, 1_000), "198.51.1.44");
    }

    #[test]
    fn every_probe_is_answered() {
        let engine = engine();
        let records = run_simulation(&engine, &plan(200, Vec::new()));
        assert_eq!(records.len(), 200);
        assert!(records.iter().all(|record| record.group_id == "lobby"));
        assert!(records.iter().all(|record| !record.rich_payload));
        let counted: u64 = engine.stats().iter().map(|entry| entry.count).sum();
        assert_eq!(counted, 200);
    }

    #[test]
    fn hosts_route_probes() {
        let engine = engine();
        let records = run_simulation(&engine, &plan(30, vec!["events.example.net".to_string()]));
        assert!(records.iter().all(|record| record.group_id == "events"));
        assert!(records.iter().all(|record| record.online == 15 && record.max == 200));
    }
}
