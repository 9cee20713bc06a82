//! Sparse routing grid and bend-penalized A* search.
//!
//! The grid only has lines where something interesting happens (exits,
//! obstacle sides, the search universe), so its size depends on the number
//! of distinct coordinates rather than on canvas scale. Nodes are stored in
//! a `petgraph` graph whose edges link 4-neighbours by grid address, each
//! labelled with the heading travelled along it.

use crate::endpoint::ResolvedEndpoint;
use crate::geometry::{DEDUP_THRESHOLD, segment_is_clear};
use crate::layout::ObstacleLayout;
use crate::model::{Heading, Point, Rect};
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Axis coordinates closer than this are merged into one grid line.
const AXIS_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridNode {
    pub pos: Point,
    /// `(column, row)`.
    pub addr: (usize, usize),
}

/// Cross product of the sparse x and y axes.
#[derive(Debug, Clone)]
pub struct Grid {
    graph: Graph<GridNode, Heading>,
    xs: Vec<f64>,
    ys: Vec<f64>,
}

fn sorted_axis(mut values: Vec<f64>) -> Vec<f64> {
    values.retain(|v| v.is_finite());
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() <= AXIS_EPSILON);
    values
}

fn axis_address(axis: &[f64], value: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - value).abs().total_cmp(&(*b - value).abs()))
        .filter(|(_, v)| (*v - value).abs() <= AXIS_EPSILON)
        .map(|(i, _)| i)
}

impl Grid {
    /// Lines through both exits, every obstacle side, the universe sides and
    /// the middle of any gap between the two obstacles.
    pub fn build(layout: &ObstacleLayout) -> Self {
        let mut xs = vec![layout.start_exit.x, layout.end_exit.x];
        let mut ys = vec![layout.start_exit.y, layout.end_exit.y];
        for r in layout.obstacles.iter().chain(std::iter::once(&layout.common_bounds)) {
            xs.extend([r.min_x, r.max_x]);
            ys.extend([r.min_y, r.max_y]);
        }

        let [a, b] = &layout.obstacles;
        let gap = |a_lo: f64, a_hi: f64, b_lo: f64, b_hi: f64| {
            if a_hi < b_lo {
                Some((a_hi + b_lo) / 2.0)
            } else if b_hi < a_lo {
                Some((b_hi + a_lo) / 2.0)
            } else {
                None
            }
        };
        xs.extend(gap(a.min_x, a.max_x, b.min_x, b.max_x));
        ys.extend(gap(a.min_y, a.max_y, b.min_y, b.max_y));

        Self::from_axes(sorted_axis(xs), sorted_axis(ys))
    }

    fn from_axes(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let (cols, rows) = (xs.len(), ys.len());
        let mut graph = Graph::with_capacity(cols * rows, cols * rows * 4);
        for (row, y) in ys.iter().enumerate() {
            for (col, x) in xs.iter().enumerate() {
                graph.add_node(GridNode {
                    pos: Point::new(*x, *y),
                    addr: (col, row),
                });
            }
        }

        let index = |col: usize, row: usize| NodeIndex::new(row * cols + col);
        for row in 0..rows {
            for col in 0..cols {
                if col + 1 < cols {
                    graph.add_edge(index(col, row), index(col + 1, row), Heading::Right);
                    graph.add_edge(index(col + 1, row), index(col, row), Heading::Left);
                }
                if row + 1 < rows {
                    graph.add_edge(index(col, row), index(col, row + 1), Heading::Down);
                    graph.add_edge(index(col, row + 1), index(col, row), Heading::Up);
                }
            }
        }
        Self { graph, xs, ys }
    }

    /// `(columns, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.xs.len(), self.ys.len())
    }

    pub fn node_at(&self, p: Point) -> Option<NodeIndex> {
        let col = axis_address(&self.xs, p.x)?;
        let row = axis_address(&self.ys, p.y)?;
        Some(NodeIndex::new(row * self.xs.len() + col))
    }

    pub fn node(&self, index: NodeIndex) -> Option<&GridNode> {
        self.graph.node_weight(index)
    }

    /// A* from `from` to `to`, both of which must be grid nodes.
    ///
    /// The first edge must follow `start.heading` and the last edge must
    /// travel `end.heading.opposite()` whenever that end requires its
    /// heading. Reversing onto the previous edge is never allowed. Each turn
    /// costs the cube of the Manhattan distance between the two endpoints.
    /// Returns `None` when the open set runs dry.
    pub fn search(
        &self,
        from: Point,
        to: Point,
        start: &ResolvedEndpoint,
        end: &ResolvedEndpoint,
        obstacles: &[Rect],
    ) -> Option<Vec<Point>> {
        let source = self.node_at(from)?;
        let goal = self.node_at(to)?;
        let goal_pos = self.graph[goal].pos;

        let bend = endpoint_span(start, end);
        let bend_penalty = bend.powi(3);
        let approach = end.heading.opposite();

        let count = self.graph.node_count();
        let mut best_cost = vec![f64::INFINITY; count];
        let mut prev: Vec<Option<NodeIndex>> = vec![None; count];
        let mut arrived = vec![start.heading; count];
        let mut closed = vec![false; count];
        let mut heap = BinaryHeap::new();

        best_cost[source.index()] = 0.0;
        heap.push(GridEntry {
            est: estimate(self.graph[source].pos, start.heading, goal_pos, approach, bend),
            cost: 0.0,
            node: source,
        });

        while let Some(GridEntry { cost, node, .. }) = heap.pop() {
            let i = node.index();
            if closed[i] || cost > best_cost[i] {
                continue;
            }
            if node == goal {
                return Some(self.reconstruct(&prev, goal));
            }
            closed[i] = true;

            let previous = arrived[i];
            let here = self.graph[node].pos;
            for edge in self.graph.edges(node) {
                let next = edge.target();
                let heading = *edge.weight();
                if closed[next.index()] || heading == previous.opposite() {
                    continue;
                }
                if node == source && start.requires_heading() && heading != start.heading {
                    continue;
                }
                if next == goal && end.requires_heading() && heading != approach {
                    continue;
                }
                let there = self.graph[next].pos;
                if !segment_is_clear(here, there, obstacles) {
                    continue;
                }

                let mut next_cost = cost + here.manhattan(there);
                if heading != previous {
                    next_cost += bend_penalty;
                }
                if next_cost >= best_cost[next.index()] {
                    continue;
                }
                best_cost[next.index()] = next_cost;
                prev[next.index()] = Some(node);
                arrived[next.index()] = heading;
                heap.push(GridEntry {
                    est: next_cost + estimate(there, heading, goal_pos, approach, bend),
                    cost: next_cost,
                    node: next,
                });
            }
        }
        log::trace!("grid search exhausted ({} nodes)", count);
        None
    }

    fn reconstruct(&self, prev: &[Option<NodeIndex>], goal: NodeIndex) -> Vec<Point> {
        let mut path = vec![self.graph[goal].pos];
        let mut cursor = goal;
        while let Some(p) = prev[cursor.index()] {
            path.push(self.graph[p].pos);
            cursor = p;
        }
        path.reverse();
        path
    }
}

/// Manhattan distance between the real ends, not the exits the search runs
/// between. Turn costs and the heuristic are scaled by it.
fn endpoint_span(start: &ResolvedEndpoint, end: &ResolvedEndpoint) -> f64 {
    start.point.manhattan(end.point)
}

/// Remaining Manhattan distance, plus `2·bend²` when the current heading
/// runs along the approach axis but the node is off the goal's line, since
/// at least two more turns are then needed.
fn estimate(pos: Point, heading: Heading, goal: Point, approach: Heading, bend: f64) -> f64 {
    let mut h = pos.manhattan(goal);
    let axis = approach.axis();
    if heading.axis() == axis && (pos.across(axis) - goal.across(axis)).abs() > DEDUP_THRESHOLD {
        h += 2.0 * bend * bend;
    }
    h
}

/// Open-set entry, min-ordered by estimated total cost.
#[derive(Debug, Clone, Copy)]
struct GridEntry {
    est: f64,
    cost: f64,
    node: NodeIndex,
}

impl Ord for GridEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .est
            .total_cmp(&self.est)
            .then_with(|| other.cost.total_cmp(&self.cost))
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

impl PartialOrd for GridEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GridEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GridEntry {}

/// Grid path from the start exit to the end exit of `layout`.
pub fn find_path(
    layout: &ObstacleLayout,
    start: &ResolvedEndpoint,
    end: &ResolvedEndpoint,
) -> Option<Vec<Point>> {
    let grid = Grid::build(layout);
    let (cols, rows) = grid.dimensions();
    log::trace!("grid {cols}x{rows}");
    grid.search(layout.start_exit, layout.end_exit, start, end, layout.search_obstacles())
}
