//! A* pathfinding over a square walkability grid
//!
//! Cells are one world unit wide; a point maps to the cell containing it.
//! Diagonal steps may not cut the corner of a blocked cell.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};
use glam::Vec3;

pub type Cell = (i32, i32);

const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    cell: Cell,
    f_cost: f32, // g_cost + heuristic
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other.f_cost.total_cmp(&self.f_cost)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct NavGrid {
    width: i32,
    height: i32,
    blocked: AHashSet<Cell>,
}

impl NavGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            blocked: AHashSet::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_of(point: Vec3) -> Cell {
        (point.x.floor() as i32, point.z.floor() as i32)
    }

    pub fn center_of(cell: Cell) -> Vec3 {
        Vec3::new(cell.0 as f32 + 0.5, 0.0, cell.1 as f32 + 0.5)
    }

    pub fn block(&mut self, cell: Cell) {
        self.blocked.insert(cell);
    }

    pub fn unblock(&mut self, cell: Cell) {
        self.blocked.remove(&cell);
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.0 >= 0 && cell.1 >= 0 && cell.0 < self.width && cell.1 < self.height
    }

    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.blocked.contains(&cell)
    }

    /// Clamp a point into the grid and onto the nearest walkable cell found by a ring search
    pub fn nearest_walkable(&self, point: Vec3) -> Option<Vec3> {
        let max_x = (self.width as f32 - 0.5).max(0.5);
        let max_z = (self.height as f32 - 0.5).max(0.5);
        let clamped = Vec3::new(point.x.clamp(0.5, max_x), point.y, point.z.clamp(0.5, max_z));
        let origin = Self::cell_of(clamped);
        if self.is_walkable(origin) {
            return Some(clamped);
        }
        let reach = self.width.max(self.height);
        for ring in 1..=reach {
            for dx in -ring..=ring {
                for dz in -ring..=ring {
                    if dx.abs() != ring && dz.abs() != ring {
                        continue;
                    }
                    let cell = (origin.0 + dx, origin.1 + dz);
                    if self.is_walkable(cell) {
                        return Some(Self::center_of(cell));
                    }
                }
            }
        }
        None
    }

    /// Waypoints from `from` to `to`, both included; `None` when no complete path exists
    pub fn find_path(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>> {
        let start = Self::cell_of(from);
        let goal = Self::cell_of(to);
        // The start cell is where the agent already stands
        if !self.in_bounds(start) || !self.is_walkable(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![from, to]);
        }

        let mut open_set = BinaryHeap::new();
        let mut came_from: AHashMap<Cell, Cell> = AHashMap::new();
        let mut g_scores: AHashMap<Cell, f32> = AHashMap::new();

        g_scores.insert(start, 0.0);
        open_set.push(PathNode {
            cell: start,
            f_cost: octile(start, goal),
        });

        while let Some(current) = open_set.pop() {
            if current.cell == goal {
                let cells = reconstruct_path(&came_from, goal);
                let mut path = Vec::with_capacity(cells.len() + 1);
                path.push(from);
                path.extend(cells.iter().skip(1).take(cells.len().saturating_sub(2)).map(|&c| Self::center_of(c)));
                path.push(to);
                return Some(path);
            }

            let current_g = g_scores.get(&current.cell).copied().unwrap_or(f32::INFINITY);
            if current.f_cost > current_g + octile(current.cell, goal) + f32::EPSILON {
                continue; // stale heap entry
            }

            for (dx, dz) in NEIGHBORS {
                let neighbor = (current.cell.0 + dx, current.cell.1 + dz);
                if !self.is_walkable(neighbor) {
                    continue;
                }
                let diagonal = dx != 0 && dz != 0;
                if diagonal
                    && (!self.is_walkable((current.cell.0 + dx, current.cell.1))
                        || !self.is_walkable((current.cell.0, current.cell.1 + dz)))
                {
                    continue;
                }

                let step = if diagonal { std::f32::consts::SQRT_2 } else { 1.0 };
                let tentative_g = current_g + step;
                let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(f32::INFINITY);
                if tentative_g < neighbor_g {
                    came_from.insert(neighbor, current.cell);
                    g_scores.insert(neighbor, tentative_g);
                    open_set.push(PathNode {
                        cell: neighbor,
                        f_cost: tentative_g + octile(neighbor, goal),
                    });
                }
            }
        }

        None
    }
}

fn octile(a: Cell, b: Cell) -> f32 {
    let dx = (a.0 - b.0).abs() as f32;
    let dz = (a.1 - b.1).abs() as f32;
    dx.max(dz) + (std::f32::consts::SQRT_2 - 1.0) * dx.min(dz)
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &AHashMap<Cell, Cell>, mut current: Cell) -> Vec<Cell> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
