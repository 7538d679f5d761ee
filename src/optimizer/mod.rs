//! # Optimizer Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `dispatcher`: Scelta del backend e merge della configurazione
//! - `task_optimizer`: Worker per singoli file
//! - `image_optimizer`: Orchestratore principale (file, batch, directory)

pub mod dispatcher;
pub mod image_optimizer;
pub mod task_optimizer;

pub use dispatcher::Dispatcher;
pub use image_optimizer::{DirectoryScan, ImageOptimizer};
pub use task_optimizer::Optimizer;
