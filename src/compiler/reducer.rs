use std::f64::consts::TAU;
use log::debug;

use crate::quantum::circuit::{Axis, Circuit, GateEntry};
use crate::synthesis::round2;

/// Lower edge of the band of angles treated as a full turn
pub const FULL_TURN_BAND: f64 = 6.25;

/// Sums above this wrap back into one turn
pub const WRAP_THRESHOLD: f64 = 6.28;

/// Rewrite rules for expanded circuits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionRule {
    /// Drop rotations by zero or by (almost) a full turn
    RemoveIdentities,
    /// Move an Rz behind a CZ that shares its qubit
    CommuteThroughCz,
    /// Combine adjacent rotations about the same axis on the same qubit
    MergeRotations,
    /// Drop two identical adjacent CZ gates
    CancelCzPairs,
    /// All rules
    All,
}

/// Fixpoint peephole reducer.
///
/// Each pass applies the enabled rules in declaration order; passes repeat while
/// the circuit keeps shrinking.
#[derive(Clone, Debug)]
pub struct CircuitReducer {
    rules: Vec<ReductionRule>,
}

impl Default for CircuitReducer {
    fn default() -> Self {
        CircuitReducer {
            rules: vec![ReductionRule::All],
        }
    }
}

impl CircuitReducer {
    /// Create a reducer with specific rules
    pub fn new(rules: Vec<ReductionRule>) -> Self {
        CircuitReducer { rules }
    }

    fn is_rule_enabled(&self, rule: ReductionRule) -> bool {
        self.rules.contains(&rule) || self.rules.contains(&ReductionRule::All)
    }

    /// One application of every enabled rule
    pub fn pass(&self, circuit: &Circuit) -> Circuit {
        let mut entries = circuit.entries.clone();

        if self.is_rule_enabled(ReductionRule::RemoveIdentities) {
            entries = remove_identities(&entries);
        }

        if self.is_rule_enabled(ReductionRule::CommuteThroughCz) {
            entries = commute_through_cz(&entries);
        }

        if self.is_rule_enabled(ReductionRule::MergeRotations) {
            entries = merge_rotations(&entries);
        }

        if self.is_rule_enabled(ReductionRule::CancelCzPairs) {
            entries = cancel_cz_pairs(&entries);
        }

        Circuit::from_entries(entries)
    }

    /// Repeat passes until one leaves the length unchanged
    pub fn reduce(&self, circuit: &Circuit) -> Circuit {
        let mut current = circuit.clone();
        let mut passes = 0;

        loop {
            let before = current.len();
            current = self.pass(&current);
            passes += 1;
            debug!("reduction pass {}: {} -> {} gates", passes, before, current.len());
            if current.len() >= before {
                break;
            }
        }

        current
    }
}

/// Whether a rotation by `angle` is the identity under two-decimal rounding
pub fn is_identity_angle(angle: f64) -> bool {
    angle == 0.0 || (FULL_TURN_BAND..=TAU).contains(&angle)
}

/// Sum of two angles, wrapped into one turn and rounded to two decimals
pub fn merge_angles(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum > WRAP_THRESHOLD {
        round2(sum - (sum / TAU).floor() * TAU)
    } else {
        round2(sum)
    }
}

fn remove_identities(entries: &[GateEntry]) -> Vec<GateEntry> {
    entries
        .iter()
        .filter(|entry| !matches!(entry, GateEntry::Rotation { angle, .. } if is_identity_angle(*angle)))
        .copied()
        .collect()
}

fn rz_meets_cz(first: &GateEntry, second: &GateEntry) -> bool {
    match (first, second) {
        (GateEntry::Rotation { axis: Axis::Z, qubit, .. }, GateEntry::Cz { control, target }) => {
            qubit == control || qubit == target
        }
        _ => false,
    }
}

/// Rz is diagonal, so it commutes with CZ; swap until no Rz sits directly before a CZ on its qubit
fn commute_through_cz(entries: &[GateEntry]) -> Vec<GateEntry> {
    let mut result = entries.to_vec();
    let mut swapped = true;

    while swapped {
        swapped = false;
        for i in 0..result.len().saturating_sub(1) {
            if rz_meets_cz(&result[i], &result[i + 1]) {
                result.swap(i, i + 1);
                swapped = true;
            }
        }
    }

    result
}

fn merge_rotations(entries: &[GateEntry]) -> Vec<GateEntry> {
    let mut result: Vec<GateEntry> = Vec::with_capacity(entries.len());

    for &entry in entries {
        if let (
            Some(GateEntry::Rotation { axis: prev_axis, angle: prev_angle, qubit: prev_qubit }),
            GateEntry::Rotation { axis, angle, qubit },
        ) = (result.last_mut(), entry)
        {
            if *prev_axis == axis && *prev_qubit == qubit {
                *prev_angle = merge_angles(*prev_angle, angle);
                continue;
            }
        }
        result.push(entry);
    }

    result
}

fn cancel_cz_pairs(entries: &[GateEntry]) -> Vec<GateEntry> {
    let mut result: Vec<GateEntry> = Vec::with_capacity(entries.len());

    for &entry in entries {
        let cancels = matches!(
            (result.last(), entry),
            (Some(GateEntry::Cz { control: c1, target: t1 }), GateEntry::Cz { control: c2, target: t2 })
                if *c1 == c2 && *t1 == t2
        );
        if cancels {
            result.pop();
        } else {
            result.push(entry);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_chains_in_one_pass() {
        let entries = vec![GateEntry::rz(1.0, 0), GateEntry::rz(1.0, 0), GateEntry::rz(1.0, 0)];
        assert_eq!(merge_rotations(&entries), vec![GateEntry::rz(3.0, 0)]);
    }

    #[test]
    fn test_rz_bubbles_through_consecutive_cz() {
        let entries = vec![GateEntry::rz(1.0, 0), GateEntry::cz(0, 1), GateEntry::cz(1, 0)];
        assert_eq!(
            commute_through_cz(&entries),
            vec![GateEntry::cz(0, 1), GateEntry::cz(1, 0), GateEntry::rz(1.0, 0)]
        );
    }

    #[test]
    fn test_rx_does_not_commute() {
        let entries = vec![GateEntry::rx(1.0, 0), GateEntry::cz(0, 1)];
        assert_eq!(commute_through_cz(&entries), entries);
    }

    #[test]
    fn test_cz_on_other_qubits_stays() {
        let entries = vec![GateEntry::rz(1.0, 2), GateEntry::cz(0, 1)];
        assert_eq!(commute_through_cz(&entries), entries);
    }

    #[test]
    fn test_odd_cz_run_leaves_one() {
        let entries = vec![GateEntry::cz(0, 1); 3];
        assert_eq!(cancel_cz_pairs(&entries), vec![GateEntry::cz(0, 1)]);
    }

    #[test]
    fn test_reversed_cz_pair_is_kept() {
        let entries = vec![GateEntry::cz(0, 1), GateEntry::cz(1, 0)];
        assert_eq!(cancel_cz_pairs(&entries), entries);
    }
}
