//! Per-road R-tree over the lane intervals objects touch.
//!
//! Each object contributes one degenerate box per (road, lane) it touches:
//! `[lane, s_start]` to `[lane, s_end]`.  A lane query is then an envelope
//! query with both lane corners equal.

use rstar::{RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use tq_core::{LaneId, ObjectId, WorldObject};

#[derive(Clone, Debug, PartialEq)]
struct LaneEntry {
    lane:    LaneId,
    s_start: f64,
    s_end:   f64,
    id:      ObjectId,
}

impl RTreeObject for LaneEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        let lane = self.lane as f64;
        AABB::from_corners([lane, self.s_start], [lane, self.s_end])
    }
}

#[derive(Default)]
pub(crate) struct ObjectIndex {
    roads: FxHashMap<String, RTree<LaneEntry>>,
}

fn entries(object: &WorldObject) -> impl Iterator<Item = (&str, LaneEntry)> + '_ {
    object.position.touched_roads.iter().flat_map(move |(road, interval)| {
        interval.lanes.iter().map(move |&lane| {
            (road.as_str(), LaneEntry {
                lane,
                s_start: interval.s_start,
                s_end: interval.s_end,
                id: object.id,
            })
        })
    })
}

impl ObjectIndex {
    pub(crate) fn insert(&mut self, object: &WorldObject) {
        for (road, entry) in entries(object) {
            self.roads.entry(road.to_string()).or_default().insert(entry);
        }
    }

    /// Must be called with the object as it was inserted.
    pub(crate) fn remove(&mut self, object: &WorldObject) {
        for (road, entry) in entries(object) {
            if let Some(tree) = self.roads.get_mut(road) {
                tree.remove(&entry);
            }
        }
    }

    /// Ids touching `lane` of `road` within `[s_start, s_end]`, ascending.
    pub(crate) fn query(&self, road: &str, lane: LaneId, s_start: f64, s_end: f64) -> Vec<ObjectId> {
        let Some(tree) = self.roads.get(road) else {
            return Vec::new();
        };
        let lane = lane as f64;
        let envelope = AABB::from_corners([lane, s_start.min(s_end)], [lane, s_start.max(s_end)]);
        let mut ids: Vec<ObjectId> =
            tree.locate_in_envelope_intersecting(&envelope).map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
