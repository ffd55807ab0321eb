// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Board engine shared by the TaskBuddy server and its clients.
//!
//! Tasks are grouped into three status buckets. Moving a task between
//! buckets, by drag-and-drop, by its status control, or in bulk over a
//! selection, is applied to the local [`Board`] first and then persisted
//! through a [`TaskStore`]. When the store refuses a change, the board puts
//! the affected tasks back exactly where they were and raises a [`Notice`].

pub mod board;
pub mod bucket;
pub mod bulk;
pub mod collision;
pub mod drag;
pub mod error;
pub mod filter;
pub mod notice;
pub mod selection;
pub mod store;
pub mod task;
pub mod transition;

pub use board::Board;
pub use bucket::{BucketKey, BucketedTasks, bucket_key_of, label_of, partition};
pub use bulk::{BatchAction, BulkFailure, BulkOutcome, PendingBatch};
pub use collision::{CollisionStrategy, Droppable, Rect};
pub use drag::{Direction, DragController, DragMode, Sensor, SensorInput, TransitionRequest};
pub use error::{BoardError, StoreError};
pub use filter::{DueFilter, TaskFilter};
pub use notice::{Notice, NoticeLevel, Notices};
pub use selection::Selection;
pub use store::{MemoryStore, StoreCall, TaskStore};
pub use task::{Activity, Category, FileAttachment, NewTask, Status, Task, TaskPatch};
pub use transition::{PendingTransition, TransitionOutcome};
