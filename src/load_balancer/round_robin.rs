//! Round-robin selection that skips nodes in backoff.

use std::time::Duration;
use tokio::time::Instant;

use crate::load_balancer::{backend::NodeHealth, Pick, Picker};

/// Rotates through nodes in insertion order.
///
/// Scans one full circle from the cursor and stops on the first node that
/// is out of backoff. When every node is backed off it returns the one that
/// recovers soonest together with the remaining wait.
#[derive(Debug, Default)]
pub struct RoundRobinPicker {
    cursor: usize,
}

impl RoundRobinPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl Picker for RoundRobinPicker {
    fn pick(&mut self, nodes: &[NodeHealth], now: Instant) -> Pick {
        let len = nodes.len();
        if len <= 1 {
            return Pick {
                index: 0,
                wait: nodes.first().map_or(Duration::ZERO, |n| n.wait_at(now)),
            };
        }

        self.cursor %= len;
        let mut soonest: Option<Pick> = None;
        for step in 0..len {
            let index = (self.cursor + step) % len;
            let wait = nodes[index].wait_at(now);
            if wait.is_zero() {
                self.cursor = index;
                return Pick { index, wait };
            }
            if soonest.map_or(true, |best| wait < best.wait) {
                soonest = Some(Pick { index, wait });
            }
        }

        let pick = soonest.unwrap_or(Pick {
            index: self.cursor,
            wait: Duration::ZERO,
        });
        self.cursor = pick.index;
        pick
    }

    fn advance(&mut self, len: usize) {
        if len > 0 {
            self.cursor = (self.cursor + 1) % len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{connection::Connection, node::NodeDescriptor};

    fn nodes(n: usize) -> Vec<NodeHealth> {
        (0..n)
            .map(|i| {
                let descriptor = NodeDescriptor::new(&format!("node{i}")).unwrap();
                NodeHealth::new(Connection::new(&descriptor).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_round_robin_rotation() {
        let nodes = nodes(3);
        let mut picker = RoundRobinPicker::new();
        let now = Instant::now();

        let mut order = Vec::new();
        for _ in 0..4 {
            let pick = picker.pick(&nodes, now);
            assert_eq!(pick.wait, Duration::ZERO);
            order.push(pick.index);
            picker.advance(nodes.len());
        }
        assert_eq!(order, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_skips_backed_off_node() {
        let mut nodes = nodes(3);
        let now = Instant::now();
        nodes[1].mark_failure(now, Duration::from_secs(1), 10);

        let mut picker = RoundRobinPicker::new();
        picker.advance(3);
        let pick = picker.pick(&nodes, now);
        assert_eq!(pick.index, 2);
        assert_eq!(pick.wait, Duration::ZERO);
    }

    #[test]
    fn test_all_backed_off_returns_soonest() {
        let mut nodes = nodes(3);
        let now = Instant::now();
        nodes[0].mark_failure(now, Duration::from_secs(4), 10);
        nodes[1].mark_failure(now, Duration::from_secs(1), 10);
        nodes[2].mark_failure(now, Duration::from_secs(2), 10);

        let mut picker = RoundRobinPicker::new();
        let pick = picker.pick(&nodes, now);
        assert_eq!(pick, Pick { index: 1, wait: Duration::from_secs(1) });
        assert_eq!(picker.cursor(), 1);
    }

    #[test]
    fn test_single_node_always_picked() {
        let mut nodes = nodes(1);
        let now = Instant::now();
        let mut picker = RoundRobinPicker::new();
        assert_eq!(picker.pick(&nodes, now).index, 0);

        nodes[0].mark_failure(now, Duration::from_millis(500), 10);
        let pick = picker.pick(&nodes, now);
        assert_eq!(pick.index, 0);
        assert_eq!(pick.wait, Duration::from_millis(500));
    }
}
