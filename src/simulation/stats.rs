//! Periodic population statistics with a bounded history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::agent::Agent;

/// Population statistics at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Live agents.
    pub population: usize,
    /// Mean fitness.
    pub avg_fitness: f32,
    /// Best fitness.
    pub max_fitness: f32,
    /// Mean energy.
    pub avg_energy: f32,
    /// Registered species.
    pub species_count: usize,
    /// Births since the previous snapshot.
    pub births: usize,
    /// Deaths since the previous snapshot.
    pub deaths: usize,
}

impl StatsSnapshot {
    /// Summarizes a population.
    pub fn collect(
        tick: u64,
        agents: &[Agent],
        species_count: usize,
        births: usize,
        deaths: usize,
    ) -> Self {
        let population = agents.len();
        let n = population.max(1) as f32;
        Self {
            tick,
            population,
            avg_fitness: agents.iter().map(|a| a.fitness).sum::<f32>() / n,
            max_fitness: agents.iter().map(|a| a.fitness).fold(0.0, f32::max),
            avg_energy: agents.iter().map(|a| a.energy).sum::<f32>() / n,
            species_count,
            births,
            deaths,
        }
    }
}

/// Snapshot history, oldest first, capped at a fixed number of entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsHistory {
    entries: VecDeque<StatsSnapshot>,
    capacity: usize,
}

impl Default for StatsHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl StatsHistory {
    /// Creates an empty history holding at most `capacity` snapshots.
    ///
    /// Storage grows with the entries pushed, not with `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Appends a snapshot, dropping the oldest once full.
    pub fn push(&mut self, snapshot: StatsSnapshot) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Snapshots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &StatsSnapshot> {
        self.entries.iter()
    }

    /// Most recent snapshot.
    pub fn latest(&self) -> Option<&StatsSnapshot> {
        self.entries.back()
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tick: u64) -> StatsSnapshot {
        StatsSnapshot::collect(tick, &[], 0, 0, 0)
    }

    #[test]
    fn oldest_entries_are_dropped() {
        let mut history = StatsHistory::new(3);
        for tick in 0..5 {
            history.push(snapshot(tick));
        }
        let ticks: Vec<u64> = history.iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![2, 3, 4]);
        assert_eq!(history.latest().map(|s| s.tick), Some(4));
    }

    #[test]
    fn huge_capacity_does_not_reserve() {
        let mut history = StatsHistory::new(usize::MAX);
        assert!(history.is_empty());
        history.push(snapshot(7));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().map(|s| s.tick), Some(7));
    }

    #[test]
    fn empty_population_summary() {
        let s = snapshot(0);
        assert_eq!(s.population, 0);
        assert_eq!(s.avg_fitness, 0.0);
    }
}
