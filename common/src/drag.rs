// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Drag session controller.
//!
//! Turns drag gestures into [`TransitionRequest`]s. The controller is either
//! idle or tracking exactly one active task; every drag end returns it to idle.

use crate::bucket::{BucketKey, BucketedTasks};
use crate::collision::{CollisionStrategy, Droppable, Rect};
use crate::error::BoardError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Keyboard sensors move the card by this many pixels per key press.
pub const KEYBOARD_STEP: f64 = 25.0;

/// How a drop on another task is resolved.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    /// Board view: the task is appended to the target's column.
    Coarse,
    /// List view: the task is inserted right before the task it was dropped on.
    #[default]
    Precise,
}

impl DragMode {
    pub fn collision_strategy(self) -> CollisionStrategy {
        match self {
            DragMode::Coarse => CollisionStrategy::ClosestCorners,
            DragMode::Precise => CollisionStrategy::ClosestCenter,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sensor {
    Pointer,
    Keyboard,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorInput {
    Pointer { dx: f64, dy: f64 },
    Keyboard(Direction),
}

impl SensorInput {
    fn delta(self) -> (f64, f64) {
        match self {
            SensorInput::Pointer { dx, dy } => (dx, dy),
            SensorInput::Keyboard(Direction::Up) => (0.0, -KEYBOARD_STEP),
            SensorInput::Keyboard(Direction::Down) => (0.0, KEYBOARD_STEP),
            SensorInput::Keyboard(Direction::Left) => (-KEYBOARD_STEP, 0.0),
            SensorInput::Keyboard(Direction::Right) => (KEYBOARD_STEP, 0.0),
        }
    }
}

/// A resolved move: put `task_id` into `destination`.
///
/// `index` is a position in the destination bucket as it looks once the task
/// has been taken out of its source; `None` appends.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub task_id: String,
    pub destination: BucketKey,
    #[serde(default)]
    pub index: Option<usize>,
}

impl TransitionRequest {
    pub fn append(task_id: impl Into<String>, destination: BucketKey) -> Self {
        Self {
            task_id: task_id.into(),
            destination,
            index: None,
        }
    }
}

#[derive(Debug, Clone)]
struct DragSession {
    active_id: String,
    sensor: Sensor,
    active_rect: Option<Rect>,
    droppables: Vec<Droppable>,
    over_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    mode: DragMode,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(mode: DragMode) -> Self {
        Self {
            mode,
            session: None,
        }
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.active_id.as_str())
    }

    /// The drop target currently under the dragged card, if any.
    pub fn over_id(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.over_id.as_deref())
    }

    pub fn sensor(&self) -> Option<Sensor> {
        self.session.as_ref().map(|s| s.sensor)
    }

    /// Picks up `task_id`. The task must be on the board.
    pub fn on_drag_start(
        &mut self,
        tasks: &BucketedTasks,
        task_id: &str,
        sensor: Sensor,
    ) -> Result<(), BoardError> {
        if !tasks.contains(task_id) {
            return Err(BoardError::TaskNotFound(task_id.to_string()));
        }
        if let Some(stale) = self.session.take() {
            warn!(
                "Drag of {} started while {} was still active; dropping the old session.",
                task_id, stale.active_id
            );
        }
        debug!("Drag started for task {} ({:?})", task_id, sensor);
        self.session = Some(DragSession {
            active_id: task_id.to_string(),
            sensor,
            active_rect: None,
            droppables: Vec::new(),
            over_id: None,
        });
        Ok(())
    }

    /// Registers the dragged card's box and the drop targets, then recomputes
    /// the current target. Ignored while idle.
    pub fn set_layout(&mut self, active_rect: Rect, droppables: Vec<Droppable>) -> Option<&str> {
        let strategy = self.mode.collision_strategy();
        let session = self.session.as_mut()?;
        session.active_rect = Some(active_rect);
        session.droppables = droppables;
        session.over_id = strategy
            .detect(&active_rect, &session.droppables)
            .map(|d| d.id.clone());
        session.over_id.as_deref()
    }

    /// Moves the dragged card and returns the new drop target.
    pub fn on_drag_move(&mut self, input: SensorInput) -> Option<&str> {
        let strategy = self.mode.collision_strategy();
        let session = self.session.as_mut()?;
        let rect = session.active_rect?;
        let (dx, dy) = input.delta();
        let moved = rect.translate(dx, dy);
        session.active_rect = Some(moved);
        session.over_id = strategy
            .detect(&moved, &session.droppables)
            .map(|d| d.id.clone());
        session.over_id.as_deref()
    }

    /// Ends the drag on the target tracked by collision detection.
    pub fn drop_on_current(&mut self, tasks: &BucketedTasks) -> Option<TransitionRequest> {
        let over = self.session.as_ref().and_then(|s| s.over_id.clone());
        self.on_drag_end(tasks, over.as_deref())
    }

    /// Ends the drag on `over`. Always returns the controller to idle.
    ///
    /// Yields no request when there is no target, when the task was dropped on
    /// itself, or when either side is no longer on the board.
    pub fn on_drag_end(
        &mut self,
        tasks: &BucketedTasks,
        over: Option<&str>,
    ) -> Option<TransitionRequest> {
        let session = self.session.take()?;
        let resolved = resolve_drop(self.mode, tasks, &session.active_id, over);
        match &resolved {
            Some(request) => debug!(
                "Drop of {} resolved to {} at {:?}",
                request.task_id, request.destination, request.index
            ),
            None => debug!("Drop of {} resolved to no transition", session.active_id),
        }
        resolved
    }

    /// Abandons the drag (escape key, pointer lost).
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Drag of {} cancelled", session.active_id);
        }
    }
}

fn resolve_drop(
    mode: DragMode,
    tasks: &BucketedTasks,
    active_id: &str,
    over: Option<&str>,
) -> Option<TransitionRequest> {
    let over = over?;
    if over == active_id || !tasks.contains(active_id) {
        return None;
    }

    if let Some(destination) = BucketKey::from_target_id(over) {
        return Some(TransitionRequest::append(active_id, destination));
    }

    let (destination, _) = tasks.locate(over)?;
    let index = match mode {
        DragMode::Coarse => None,
        DragMode::Precise => tasks
            .bucket(destination)
            .iter()
            .filter(|task| task.id != active_id)
            .position(|task| task.id == over),
    };

    Some(TransitionRequest {
        task_id: active_id.to_string(),
        destination,
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::partition;
    use crate::task::{Category, Status, Task};
    use chrono::NaiveDate;

    fn task(id: &str, status: Status) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: String::new(),
            category: Category::Work,
            due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            status,
            activities: Vec::new(),
            user_id: "u1".to_string(),
            files: Vec::new(),
        }
    }

    fn board() -> BucketedTasks {
        partition(vec![
            task("a", Status::Todo),
            task("b", Status::Todo),
            task("c", Status::Todo),
            task("d", Status::Completed),
        ])
    }

    #[test]
    fn test_drag_start_requires_task_on_board() {
        let mut drag = DragController::new(DragMode::Precise);
        assert_eq!(
            drag.on_drag_start(&board(), "zz", Sensor::Pointer),
            Err(BoardError::TaskNotFound("zz".to_string()))
        );
        assert!(!drag.is_dragging());

        drag.on_drag_start(&board(), "a", Sensor::Keyboard).unwrap();
        assert_eq!(drag.active_id(), Some("a"));
        assert_eq!(drag.sensor(), Some(Sensor::Keyboard));
    }

    #[test]
    fn test_drop_outside_or_on_itself_is_no_transition() {
        let tasks = board();
        let mut drag = DragController::default();

        drag.on_drag_start(&tasks, "a", Sensor::Pointer).unwrap();
        assert_eq!(drag.on_drag_end(&tasks, None), None);
        assert!(!drag.is_dragging());

        drag.on_drag_start(&tasks, "a", Sensor::Pointer).unwrap();
        assert_eq!(drag.on_drag_end(&tasks, Some("a")), None);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drop_on_column_appends() {
        let tasks = board();
        let mut drag = DragController::new(DragMode::Precise);
        drag.on_drag_start(&tasks, "a", Sensor::Pointer).unwrap();

        let request = drag.on_drag_end(&tasks, Some("completed")).unwrap();
        assert_eq!(request, TransitionRequest::append("a", BucketKey::Completed));
    }

    #[test]
    fn test_precise_drop_on_task_inserts_before_it() {
        let tasks = board();
        let mut drag = DragController::new(DragMode::Precise);

        // Upwards: [a, b, c] with c dropped on b.
        drag.on_drag_start(&tasks, "c", Sensor::Pointer).unwrap();
        let request = drag.on_drag_end(&tasks, Some("b")).unwrap();
        assert_eq!(request.destination, BucketKey::Todo);
        assert_eq!(request.index, Some(1));

        // Downwards: a dropped on c lands between b and c.
        drag.on_drag_start(&tasks, "a", Sensor::Pointer).unwrap();
        let request = drag.on_drag_end(&tasks, Some("c")).unwrap();
        assert_eq!(request.index, Some(1));

        // Across buckets: d dropped on b.
        drag.on_drag_start(&tasks, "d", Sensor::Pointer).unwrap();
        let request = drag.on_drag_end(&tasks, Some("b")).unwrap();
        assert_eq!(request.destination, BucketKey::Todo);
        assert_eq!(request.index, Some(1));
    }

    #[test]
    fn test_coarse_drop_on_task_appends_to_its_column() {
        let tasks = board();
        let mut drag = DragController::new(DragMode::Coarse);
        drag.on_drag_start(&tasks, "a", Sensor::Pointer).unwrap();

        let request = drag.on_drag_end(&tasks, Some("d")).unwrap();
        assert_eq!(request, TransitionRequest::append("a", BucketKey::Completed));
    }

    #[test]
    fn test_unknown_target_is_no_transition() {
        let tasks = board();
        let mut drag = DragController::default();
        drag.on_drag_start(&tasks, "a", Sensor::Pointer).unwrap();
        assert_eq!(drag.on_drag_end(&tasks, Some("archived")), None);
    }

    #[test]
    fn test_drag_end_without_start_is_no_transition() {
        let mut drag = DragController::default();
        assert_eq!(drag.on_drag_end(&board(), Some("completed")), None);
    }

    #[test]
    fn test_keyboard_moves_track_current_target() {
        let tasks = board();
        let mut drag = DragController::new(DragMode::Coarse);
        drag.on_drag_start(&tasks, "a", Sensor::Keyboard).unwrap();

        let columns = vec![
            Droppable::new("todo", Rect::new(0.0, 0.0, 100.0, 400.0)),
            Droppable::new("inprogress", Rect::new(100.0, 0.0, 100.0, 400.0)),
        ];
        let over = drag.set_layout(Rect::new(0.0, 0.0, 100.0, 400.0), columns);
        assert_eq!(over, Some("todo"));

        for _ in 0..3 {
            drag.on_drag_move(SensorInput::Keyboard(Direction::Right));
        }
        assert_eq!(drag.over_id(), Some("inprogress"));

        let request = drag.drop_on_current(&tasks).unwrap();
        assert_eq!(request, TransitionRequest::append("a", BucketKey::InProgress));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut drag = DragController::default();
        drag.on_drag_start(&board(), "b", Sensor::Pointer).unwrap();
        drag.cancel();
        assert!(!drag.is_dragging());
        assert_eq!(drag.over_id(), None);
    }
}
