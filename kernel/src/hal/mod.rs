//! Hardware Abstraction Layer (hal)
//!
//! Device drivers that talk to hardware registers directly.
//!
//! - **ata**: ATA/IDE disk driver, PIO polling mode

pub mod ata;
