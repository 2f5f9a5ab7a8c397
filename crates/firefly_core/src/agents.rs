use crate::spatial_hash::SpatialHash;
use firefly_data::{Agent, LifeState, Vec2};
use std::collections::HashMap;
use uuid::Uuid;

/// Exclusive owner of every agent, with an id index for weak lookups.
///
/// Agents are never removed mid-tick: kills only flip the state to `Dead`.
/// [`AgentStore::remove_dead`] runs in cleanup and rebuilds the index.
#[derive(Debug, Clone, Default)]
pub struct AgentStore {
    agents: Vec<Agent>,
    index: HashMap<Uuid, usize>,
}

impl AgentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, agent: Agent) {
        self.index.insert(agent.id, self.agents.len());
        self.agents.push(agent);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents not yet marked dead.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.agents.iter().filter(|a| a.state.is_present()).count()
    }

    #[must_use]
    pub fn mature_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_mature()).count()
    }

    #[must_use]
    pub fn index_of(&self, id: &Uuid) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<&Agent> {
        self.index_of(id).map(|i| &self.agents[i])
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Agent> {
        self.index_of(id).map(move |i| &mut self.agents[i])
    }

    /// True when the id refers to an agent that is spawning or mature.
    #[must_use]
    pub fn is_live(&self, id: &Uuid) -> bool {
        self.get(id).is_some_and(Agent::is_alive)
    }

    #[must_use]
    pub fn is_mature(&self, id: &Uuid) -> bool {
        self.get(id).is_some_and(Agent::is_mature)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Agent] {
        &self.agents
    }

    pub fn as_mut_slice(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Agent at a slice index, as returned by the neighbourhood queries.
    #[must_use]
    pub fn at(&self, idx: usize) -> Option<&Agent> {
        self.agents.get(idx)
    }

    pub fn at_mut(&mut self, idx: usize) -> Option<&mut Agent> {
        self.agents.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    #[must_use]
    pub fn positions(&self) -> Vec<Vec2> {
        self.agents.iter().map(|a| a.pos).collect()
    }

    /// Mutable access to two distinct agents.
    pub fn pair_mut(&mut self, i: usize, j: usize) -> Option<(&mut Agent, &mut Agent)> {
        if i == j || i >= self.agents.len() || j >= self.agents.len() {
            return None;
        }
        if i < j {
            let (left, right) = self.agents.split_at_mut(j);
            Some((&mut left[i], &mut right[0]))
        } else {
            let (left, right) = self.agents.split_at_mut(i);
            Some((&mut right[0], &mut left[j]))
        }
    }

    /// Indices within `radius` of `pos` whose agent passes `filter`, nearest first.
    pub fn indices_near<F>(
        &self,
        spatial: &SpatialHash,
        pos: Vec2,
        radius: f64,
        filter: F,
    ) -> Vec<usize>
    where
        F: Fn(&Agent) -> bool,
    {
        let r2 = radius * radius;
        let mut found: Vec<(usize, f64)> = Vec::new();
        spatial.query_callback(pos.x, pos.y, radius, |idx| {
            if let Some(a) = self.agents.get(idx) {
                let d2 = a.pos.distance_sq(pos);
                if d2 <= r2 && filter(a) {
                    found.push((idx, d2));
                }
            }
        });
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found.into_iter().map(|(i, _)| i).collect()
    }

    pub fn count_near<F>(&self, spatial: &SpatialHash, pos: Vec2, radius: f64, filter: F) -> usize
    where
        F: Fn(&Agent) -> bool,
    {
        let r2 = radius * radius;
        let mut count = 0;
        spatial.query_callback(pos.x, pos.y, radius, |idx| {
            if let Some(a) = self.agents.get(idx) {
                if a.pos.distance_sq(pos) <= r2 && filter(a) {
                    count += 1;
                }
            }
        });
        count
    }

    /// Nearest agent within `radius` that passes `filter`.
    pub fn nearest<F>(
        &self,
        spatial: &SpatialHash,
        pos: Vec2,
        radius: f64,
        filter: F,
    ) -> Option<(usize, f64)>
    where
        F: Fn(&Agent) -> bool,
    {
        let r2 = radius * radius;
        let mut best: Option<(usize, f64)> = None;
        spatial.query_callback(pos.x, pos.y, radius, |idx| {
            if let Some(a) = self.agents.get(idx) {
                let d2 = a.pos.distance_sq(pos);
                if d2 <= r2 && filter(a) && best.map_or(true, |(bi, bd)| (d2, idx) < (bd, bi)) {
                    best = Some((idx, d2));
                }
            }
        });
        best.map(|(i, d2)| (i, d2.sqrt()))
    }

    /// Removes agents marked dead and returns them. Rebuilds the index.
    pub fn remove_dead(&mut self) -> Vec<Agent> {
        let (dead, alive): (Vec<Agent>, Vec<Agent>) = std::mem::take(&mut self.agents)
            .into_iter()
            .partition(|a| a.state == LifeState::Dead);
        self.agents = alive;
        self.rebuild_index();
        dead
    }

    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, a) in self.agents.iter().enumerate() {
            self.index.insert(a.id, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firefly_data::{DeathCause, Digit};

    fn agent(n: u128, x: f64, y: f64) -> Agent {
        let mut a = Agent::new(Uuid::from_u128(n), Vec2::new(x, y), Digit::One);
        a.state = LifeState::Mature;
        a
    }

    #[test]
    fn test_lookup_and_removal() {
        let mut store = AgentStore::new();
        store.push(agent(1, 10.0, 10.0));
        store.push(agent(2, 20.0, 10.0));
        store.push(agent(3, 30.0, 10.0));

        let id2 = Uuid::from_u128(2);
        assert!(store.is_live(&id2));
        store.get_mut(&id2).map(|a| a.kill(DeathCause::Forced));
        assert!(!store.is_live(&id2));
        assert_eq!(store.present_count(), 2);

        let removed = store.remove_dead();
        assert_eq!(removed.len(), 1);
        assert!(store.get(&id2).is_none());
        assert_eq!(store.index_of(&Uuid::from_u128(3)), Some(1));
    }

    #[test]
    fn test_unknown_id_is_none() {
        let store = AgentStore::new();
        assert!(store.get(&Uuid::from_u128(9)).is_none());
        assert!(!store.is_live(&Uuid::from_u128(9)));
    }

    #[test]
    fn test_nearest_respects_filter_and_radius() {
        let mut store = AgentStore::new();
        store.push(agent(1, 10.0, 10.0));
        let mut young = agent(2, 12.0, 10.0);
        young.state = LifeState::Spawning;
        store.push(young);
        store.push(agent(3, 60.0, 10.0));

        let mut spatial = SpatialHash::new(25.0, 200.0, 200.0);
        spatial.build(&store.positions());

        let near = store.nearest(&spatial, Vec2::new(13.0, 10.0), 100.0, |a| a.is_mature());
        assert_eq!(near.map(|(i, _)| i), Some(0));
        assert!(store
            .nearest(&spatial, Vec2::new(150.0, 150.0), 20.0, |_| true)
            .is_none());
        let all = store.indices_near(&spatial, Vec2::new(10.0, 10.0), 60.0, |_| true);
        assert_eq!(all, vec![0, 1, 2]);
    }

    #[test]
    fn test_pair_mut_rejects_same_index() {
        let mut store = AgentStore::new();
        store.push(agent(1, 0.0, 0.0));
        store.push(agent(2, 0.0, 0.0));
        assert!(store.pair_mut(0, 0).is_none());
        let (a, b) = store.pair_mut(1, 0).expect("distinct");
        assert_eq!(a.id, Uuid::from_u128(2));
        assert_eq!(b.id, Uuid::from_u128(1));
    }
}
