// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Picks the drop target under a dragged card.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in viewport pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

type Point = (f64, f64);

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    fn corners(&self) -> [Point; 4] {
        let right = self.left + self.width;
        let bottom = self.top + self.height;
        [
            (self.left, self.top),
            (right, self.top),
            (self.left, bottom),
            (right, bottom),
        ]
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }
}

/// A registered drop target: a column (bucket key) or a task card (task id).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Droppable {
    pub id: String,
    pub rect: Rect,
}

impl Droppable {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            rect,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollisionStrategy {
    /// Mean distance between matching corners.
    ClosestCorners,
    /// Distance between centers.
    ClosestCenter,
}

fn distance(a: Point, b: Point) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

impl CollisionStrategy {
    pub fn score(self, active: &Rect, target: &Rect) -> f64 {
        match self {
            CollisionStrategy::ClosestCorners => {
                let total: f64 = active
                    .corners()
                    .iter()
                    .zip(target.corners().iter())
                    .map(|(a, b)| distance(*a, *b))
                    .sum();
                total / 4.0
            }
            CollisionStrategy::ClosestCenter => distance(active.center(), target.center()),
        }
    }

    /// Lowest score wins; ties keep the earliest registered droppable.
    pub fn detect<'a>(self, active: &Rect, droppables: &'a [Droppable]) -> Option<&'a Droppable> {
        droppables
            .iter()
            .map(|d| (self.score(active, &d.rect), d))
            .filter(|(score, _)| score.is_finite())
            .fold(None::<(f64, &Droppable)>, |best, (score, d)| match best {
                Some((best_score, _)) if best_score <= score => best,
                _ => Some((score, d)),
            })
            .map(|(_, d)| d)
    }
}
