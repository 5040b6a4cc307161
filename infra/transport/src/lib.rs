//! # Transport
//!
//! The collective operations the locality layer consumes, and `LocalFabric`, an
//! in-process implementation that lets a whole team run inside one process.
//!
//! ## Overview
//!
//! [`Collective`] is deliberately small: team size, own position, an all-gather of
//! fixed-size records and a barrier. Any runtime that offers these can host the
//! locality layer.
//!
//! [`LocalFabric`] keeps one rendezvous point per team in an `FxHashMap` behind a
//! `parking_lot::RwLock`; every simulated unit talks to it through its own
//! [`FabricEndpoint`].
//!
//! # Example
//!
//! ```rust
//! use strata_transport::{Collective, LocalFabric, TransportError};
//! use strata_domain::TeamId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TransportError> {
//!     let fabric = LocalFabric::new(2);
//!     let handles: Vec<_> = fabric
//!         .endpoints()
//!         .into_iter()
//!         .map(|ep| tokio::spawn(async move {
//!             let me = ep.my_unit(TeamId::ALL).unwrap();
//!             ep.all_gather(TeamId::ALL, &[me.get() as u8]).await
//!         }))
//!         .collect();
//!
//!     for handle in handles {
//!         assert_eq!(handle.await.unwrap()?, vec![0, 1]);
//!     }
//!     Ok(())
//! }
//! ```

mod collective;
mod error;
mod fabric;

pub use collective::Collective;
pub use error::{TransportError, TransportErrorExt};
pub use fabric::{FabricEndpoint, LocalFabric};
