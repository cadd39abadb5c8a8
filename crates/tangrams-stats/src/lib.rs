//! Statistical helpers shared by the training and evaluation crates.
//!
//! - [`descriptive`]: summary statistics (mean, variance, standard deviation) over a dataset,
//!   used for the per-word discriminative power
//! - [`mean`]: incrementally updated arithmetic means, used to accumulate rank metrics
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use tangrams_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.sample_variance, 2.5);
//! ```
//!
//! ## Accumulating a running mean
//!
//! ```
//! use tangrams_stats::mean::RunningMean;
//!
//! let mut mean = RunningMean::new();
//! mean.push(1.0);
//! mean.push(4.0);
//! assert_eq!(mean.value(), Some(2.5));
//! ```

pub mod descriptive;
pub mod mean;
