//! Cell value resolution: the per-cycle constraint-propagation fixpoint.
//!
//! Every cell contributes two nodes, one for its value and one for its
//! negation, so anticorrelated couplings are plain edges to the mirror node.
//! Couplings are bucketed into distance classes by squared doubled-coordinate
//! distance; closer classes take strict priority. Symmetric couplings between
//! unlatched cells merge nodes into groups (union-find); couplings out of a
//! latched cell or across a diode are directed voting edges instead.
//!
//! A group settles in stages, one class at a time: at each stage it first
//! merges with peer groups at that class, then tallies weighted votes from
//! all classes up to the stage over already-settled sources. A boolean
//! majority wins, a conflict settles as undefined, and a tie falls through to
//! the next class. A group that exhausts every class falls back to the
//! combined previous values of its members. The outcome is independent of
//! traversal order: merges are ordered by class and votes are commutative.

use crate::board::{Board, Status};
use crate::cell::{Cell, Value};
use crate::geom::Coord;
use crate::grid::Grid;

/// Squared doubled-coordinate distances with an effect, closest first.
///
/// 0 pairs the halves of an offset cell, 4 is adjacency, 8 kitty-corner,
/// 16 distance two; the odd values couple standalone cells to offset halves.
const CLASSES: [i32; 9] = [0, 4, 5, 8, 9, 13, 16, 17, 20];

/// Neighborhood radius in whole squares.
const RANGE: i32 = 2;

fn class_of(dist: i32) -> Option<u8> {
    CLASSES.iter().position(|&d| d == dist).map(|i| i as u8)
}

/// A directed coupling: `sink` hears `source`'s value at `class` priority.
#[derive(Debug, Clone, Copy)]
struct Vote {
    class: u8,
    sink: usize,
    source: usize,
}

/// A symmetric coupling; both sides join one group when staging reaches
/// `class` on each of them.
#[derive(Debug, Clone, Copy)]
struct MergeEdge {
    a: usize,
    b: usize,
    class: u8,
}

/// Per-root staging state; only meaningful at union-find roots.
#[derive(Debug, Default)]
struct RootState {
    resolved: bool,
    value: Value,
    /// Next distance class to stage through.
    cursor: u8,
    members: Vec<usize>,
    votes: Vec<Vote>,
}

enum Progress {
    Advanced(Value),
    Blocked,
    Exhausted,
}

/// Reusable resolution context; cleared and rebuilt every cycle.
#[derive(Debug, Default)]
pub(crate) struct Resolver {
    parent: Vec<usize>,
    states: Vec<RootState>,
    merges: Vec<MergeEdge>,
}

impl Resolver {
    /// Recomputes `value` for every cell from the coupling graph and the
    /// cells' `previous_value` snapshot.
    pub(crate) fn resolve(&mut self, cells: &mut Grid<Cell>) {
        let cols = cells.cols();
        let n_nodes = cells.rows() * cols * 2;
        self.parent.clear();
        self.parent.extend(0..n_nodes);
        self.merges.clear();
        self.states.clear();
        self.states.resize_with(n_nodes, RootState::default);
        for (id, state) in self.states.iter_mut().enumerate() {
            state.members.push(id);
        }

        let node = move |at: Coord| 2 * (at.y as usize * cols + at.x as usize);

        self.build_edges(cells, node);

        // Latched cells outside diode pairs take no input; they settle to
        // their previous value up front. Empty squares settle too so the
        // rounds below only ever wait on real dependencies.
        for at in cells.coords() {
            let cell = cells[at];
            let id = node(at);
            if cell.exists && cell.latched && !cell.is_diode() {
                let value = if cell.previous_value.is_set() {
                    cell.previous_value
                } else {
                    Value::Undefined
                };
                self.states[id].resolved = true;
                self.states[id].value = value;
                self.states[id ^ 1].resolved = true;
                self.states[id ^ 1].value = value.negate();
            } else if !cell.exists {
                self.states[id].resolved = true;
                self.states[id].value = Value::Undefined;
                self.states[id ^ 1].resolved = true;
                self.states[id ^ 1].value = Value::Undefined;
            }
        }

        // Worklist rounds in node id order until every group settles.
        loop {
            let mut unresolved = false;
            let mut progressed = false;
            for g in 0..n_nodes {
                if self.find(g) != g || self.states[g].resolved {
                    continue;
                }
                match self.try_advance(g) {
                    Progress::Advanced(value) => {
                        self.resolve_root(g, value);
                        progressed = true;
                    }
                    Progress::Exhausted => {
                        let value = self.previous_value_of(g, cells);
                        self.resolve_root(g, value);
                        progressed = true;
                    }
                    Progress::Blocked => unresolved = true,
                }
            }
            if !unresolved {
                break;
            }
            if progressed {
                continue;
            }
            // A dependency ring (diodes feeding each other) deadlocks the
            // rounds. Decide whatever already-settled sources determine,
            // else settle the first ring member from previous values.
            let mut decided = Vec::new();
            for g in 0..n_nodes {
                if self.find(g) != g || self.states[g].resolved {
                    continue;
                }
                if let Some(value) = self.snapshot_value(g) {
                    decided.push((g, value));
                }
            }
            if decided.is_empty() {
                if let Some(g) = (0..n_nodes).find(|&g| self.find(g) == g && !self.states[g].resolved)
                {
                    let value = self.previous_value_of(g, cells);
                    self.resolve_root(g, value);
                }
            } else {
                for (g, value) in decided {
                    if !self.states[g].resolved {
                        self.resolve_root(g, value);
                    }
                }
            }
        }

        for at in cells.coords() {
            if cells[at].exists {
                let root = self.find(node(at));
                cells[at].value = self.states[root].value;
            }
        }
    }

    fn build_edges(&mut self, cells: &Grid<Cell>, node: impl Fn(Coord) -> usize) {
        for at in cells.coords() {
            let cell = cells[at];
            if !cell.exists {
                continue;
            }
            for dy in -RANGE..=RANGE {
                for dx in -RANGE..=RANGE {
                    if dy == 0 && dx == 0 {
                        continue;
                    }
                    let delta = Coord::new(dy, dx);
                    let nat = at + delta;
                    let Some(&neighbor) = cells.get(nat) else {
                        continue;
                    };
                    if !neighbor.exists {
                        continue;
                    }
                    // Opposite orientations in the same alignment do not couple.
                    if cell.x != neighbor.x && cell.offset == neighbor.offset {
                        continue;
                    }
                    // Doubled coordinates, shifted half a square per offset half.
                    let mut dist_delta = Coord::new(2 * dy, 2 * dx);
                    if cell.offset {
                        dist_delta = dist_delta + cell.direction.delta();
                    }
                    if neighbor.offset {
                        dist_delta = dist_delta - neighbor.direction.delta();
                    }
                    let Some(class) = class_of(dist_delta.norm2()) else {
                        continue;
                    };
                    if !edge_allowed(cell, neighbor, delta, dist_delta) {
                        continue;
                    }
                    let anti = anticorrelated(cell, neighbor, dist_delta);
                    let sink = node(at);
                    let source = node(nat) ^ usize::from(anti);
                    self.states[sink].votes.push(Vote { class, sink, source });
                    self.states[sink ^ 1].votes.push(Vote {
                        class,
                        sink: sink ^ 1,
                        source: source ^ 1,
                    });
                    if !cell.latched
                        && !neighbor.latched
                        && edge_allowed(neighbor, cell, -delta, -dist_delta)
                    {
                        self.merges.push(MergeEdge { a: sink, b: source, class });
                        self.merges.push(MergeEdge {
                            a: sink ^ 1,
                            b: source ^ 1,
                            class,
                        });
                    }
                }
            }
        }
    }

    fn find(&mut self, mut id: usize) -> usize {
        while self.parent[id] != id {
            self.parent[id] = self.parent[self.parent[id]];
            id = self.parent[id];
        }
        id
    }

    /// Stages group `g` forward as far as its dependencies allow.
    fn try_advance(&mut self, g: usize) -> Progress {
        'stage: loop {
            let r = self.states[g].cursor;
            if r as usize == CLASSES.len() {
                return Progress::Exhausted;
            }
            for i in 0..self.merges.len() {
                let edge = self.merges[i];
                if edge.class != r {
                    continue;
                }
                let ra = self.find(edge.a);
                let rb = self.find(edge.b);
                if ra != g && rb != g {
                    continue;
                }
                let other = if ra == g { rb } else { ra };
                if other == g {
                    continue;
                }
                if self.states[other].resolved {
                    // The settled side now just votes through the directed edge.
                    continue;
                }
                if self.states[other].cursor == r {
                    self.absorb(g, other);
                    // Rescan: absorbed members can chain further merges.
                    continue 'stage;
                }
                // The peer has not staged up to this class yet.
                return Progress::Blocked;
            }
            match self.tally(g, r, true) {
                None => return Progress::Blocked,
                Some(value) if value.is_set() => return Progress::Advanced(value),
                Some(_) => self.states[g].cursor = r + 1,
            }
        }
    }

    fn absorb(&mut self, keep: usize, other: usize) {
        self.parent[other] = keep;
        let mut members = std::mem::take(&mut self.states[other].members);
        let mut votes = std::mem::take(&mut self.states[other].votes);
        self.states[keep].members.append(&mut members);
        self.states[keep].votes.append(&mut votes);
    }

    /// Tallies `g`'s votes over classes up to `up_to`.
    ///
    /// Each (sink, class) pair votes once: settled sources weigh in at +1 for
    /// one and -1 for zero, and the majority must beat the count of undefined
    /// sources. Per-pair verdicts combine through the value lattice. In
    /// strict mode an unsettled source blocks the tally (`None`); otherwise
    /// it is ignored.
    fn tally(&mut self, g: usize, up_to: u8, strict: bool) -> Option<Value> {
        let mut votes = std::mem::take(&mut self.states[g].votes);
        // Votes concatenate on merge; regroup them per (sink, class) pair.
        votes.sort_unstable_by_key(|v| (v.sink, v.class, v.source));
        let mut acc = Value::Unknown;
        let mut blocked = false;
        let mut i = 0;
        while i < votes.len() {
            let (sink, class) = (votes[i].sink, votes[i].class);
            let mut j = i;
            let mut weight = 0i32;
            let mut undefined = 0i32;
            let mut counted = false;
            while j < votes.len() && votes[j].sink == sink && votes[j].class == class {
                let vote = votes[j];
                j += 1;
                if class > up_to {
                    continue;
                }
                let source_root = self.find(vote.source);
                // Sources inside the group or its mirror do not vote.
                if source_root == g || self.find(vote.source ^ 1) == g {
                    continue;
                }
                if !self.states[source_root].resolved {
                    if strict {
                        blocked = true;
                    }
                    continue;
                }
                counted = true;
                match self.states[source_root].value {
                    Value::Zero => weight -= 1,
                    Value::One => weight += 1,
                    Value::Unknown | Value::Undefined => undefined += 1,
                }
            }
            if counted {
                if weight > undefined {
                    acc = acc.combine(Value::One);
                } else if weight < -undefined {
                    acc = acc.combine(Value::Zero);
                } else if undefined > 0 {
                    acc = Value::Undefined;
                }
            }
            i = j;
        }
        self.states[g].votes = votes;
        if blocked { None } else { Some(acc) }
    }

    /// Lenient staged tally from already-settled sources only.
    fn snapshot_value(&mut self, g: usize) -> Option<Value> {
        for r in self.states[g].cursor..CLASSES.len() as u8 {
            if let Some(value) = self.tally(g, r, false) {
                if value.is_set() {
                    return Some(value);
                }
            }
        }
        None
    }

    /// Settles root `g` and the groups holding its members' mirrors.
    fn resolve_root(&mut self, g: usize, value: Value) {
        self.states[g].resolved = true;
        self.states[g].value = value;
        let members = self.states[g].members.clone();
        for m in members {
            let mirror = self.find(m ^ 1);
            if !self.states[mirror].resolved {
                self.states[mirror].resolved = true;
                self.states[mirror].value = value.negate();
            }
        }
    }

    /// Fallback for a group no coupling determines: the lattice combination
    /// of its members' previous values, negated on mirror members.
    fn previous_value_of(&self, g: usize, cells: &Grid<Cell>) -> Value {
        let cols = cells.cols();
        let mut value = Value::Unknown;
        for &m in &self.states[g].members {
            let square = m / 2;
            let at = Coord::new((square / cols) as i32, (square % cols) as i32);
            let prev = cells[at].previous_value;
            value = value.combine(if m % 2 == 1 { prev.negate() } else { prev });
        }
        if value.is_set() { value } else { Value::Undefined }
    }
}

/// Whether a coupling edge into `cell` from `neighbor` at `delta` exists.
///
/// Diodes conduct one way: the partner side of a diode half only passes the
/// conduction edge into the latched sink, and latched cells take no other
/// input at all.
fn edge_allowed(cell: Cell, neighbor: Cell, delta: Coord, dist_delta: Coord) -> bool {
    if cell.is_diode()
        && cell.partner_delta.dot(dist_delta) > 0
        && (cell.partner_delta != delta || !cell.latched)
    {
        return false;
    }
    if neighbor.is_diode()
        && neighbor.partner_delta.dot(dist_delta) < 0
        && cell.partner_delta != delta
    {
        return false;
    }
    if cell.latched && !(cell.is_diode() && cell.partner_delta == delta) {
        return false;
    }
    true
}

/// Whether the coupling inverts: axis-aligned `x`-family pairs agree, diagonal
/// ones disagree, and the `+` family is the other way around. Mixed pairs
/// (standalone against offset half) go by which side of the diagonal the
/// doubled delta falls on.
fn anticorrelated(cell: Cell, neighbor: Cell, d: Coord) -> bool {
    if cell.x == neighbor.x {
        cell.x ^ (d.y == 0 || d.x == 0)
    } else {
        (d.y > d.x) ^ (-d.y > d.x) ^ (d.y * d.x < 0)
    }
}

impl Board {
    /// Snapshots previous values, seeds input ports from the current test
    /// vector, and recomputes every cell value. No-op unless running.
    pub fn resolve(&mut self) {
        if self.status() != Status::Running {
            return;
        }
        for at in self.cells.coords() {
            let cell = &mut self.cells[at];
            cell.previous_value = cell.value;
        }
        for k in 0..self.inputs.len() {
            let at = self.inputs[k].location;
            self.cells[at].previous_value = self.input_bit(k);
        }
        self.resolver.resolve(&mut self.cells);
        tracing::trace!(cycle = self.cycle, "board resolved");
    }
}
