//! # Names Service
//!
//! A tour of the Composable Reactor operator library over a tiny data set:
//! the names `alex`, `ben` and `chloe`.
//!
//! This example showcases:
//! - Building sources (`Seq::from_iterable`, `Opt::just`, `seq!`)
//! - Per-item transforms (`map`, `filter`, `transform`)
//! - Flattening with and without ordering (`flat_map`, `concat_map`)
//! - Empty-source fallbacks (`default_if_empty`, `switch_if_empty`)
//! - Combining sources (`concat`, `merge`, `merge_sequential`, `zip`)
//!
//! ## Delays
//!
//! The "async" pipelines delay each letter by an amount drawn from a
//! [`DelaySource`]. Production uses random delays; tests inject a fixed one.
//!
//! ## Example
//!
//! ```no_run
//! use composable_reactor_runtime::{Driver, DriverConfig};
//! use names_service::NamesService;
//!
//! # async fn example() -> Result<(), composable_reactor_runtime::DriveError> {
//! let service = NamesService::new();
//! let driver = Driver::tokio(DriverConfig::default())?;
//!
//! let outcome = driver.collect(&service.names_flat_map(3)).await?;
//! assert_eq!(outcome.items.concat(), "ALEXCHLOE");
//! # Ok(())
//! # }
//! ```

use composable_reactor_core::{Opt, Seq, concat, merge, merge_sequential, zip, zip_all};
use rand::Rng;
use std::time::Duration;

/// The data set every pipeline starts from
pub const NAMES: [&str; 3] = ["alex", "ben", "chloe"];

/// Per-item delay of the `A, B, C` source in the merge demonstrations
pub const ABC_DELAY: Duration = Duration::from_millis(100);

/// Per-item delay of the `D, E, F` source in the merge demonstrations
pub const DEF_DELAY: Duration = Duration::from_millis(125);

/// Where the per-letter delays of the async pipelines come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelaySource {
    /// Uniformly random in `0..=max`, drawn once per split name
    Random {
        /// Largest delay drawn
        max: Duration,
    },
    /// Always the same delay
    Fixed(Duration),
}

impl DelaySource {
    /// Draw the delay for the next split.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Random { max } => {
                let max_millis = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
                Duration::from_millis(rand::thread_rng().gen_range(0..=max_millis))
            },
        }
    }
}

impl Default for DelaySource {
    fn default() -> Self {
        Self::Random {
            max: Duration::from_millis(1000),
        }
    }
}

/// Generates the demonstration pipelines
#[derive(Debug, Clone, Default)]
pub struct NamesService {
    delays: DelaySource,
}

fn names_source() -> Seq<String> {
    Seq::from_iterable(NAMES.map(String::from))
}

fn upper_longer_than(names: Seq<String>, length: usize) -> Seq<String> {
    names
        .map(|name| name.to_uppercase())
        .filter(move |name| name.len() > length)
}

fn letters(items: &[&'static str]) -> Seq<String> {
    Seq::from_iterable(items.iter().map(|item| (*item).to_string()).collect::<Vec<_>>())
}

/// `ALEX` becomes `A, L, E, X`.
#[must_use]
pub fn split_string(name: &str) -> Seq<String> {
    Seq::from_iterable(name.chars().map(String::from).collect::<Vec<_>>())
}

impl NamesService {
    /// Create a service drawing random letter delays of up to one second
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service drawing letter delays from `delays`
    #[must_use]
    pub const fn with_delays(delays: DelaySource) -> Self {
        Self { delays }
    }

    /// `ALEX` becomes `A, L, E, X`, each letter delayed by the next drawn delay.
    #[must_use]
    pub fn split_string_with_delay(&self, name: &str) -> Seq<String> {
        split_string(name).delay_elements(self.delays.next_delay())
    }

    fn splitter(&self) -> impl Fn(String) -> Seq<String> + Send + Sync + 'static {
        let service = self.clone();
        move |name| service.split_string_with_delay(&name)
    }

    /// `alex, ben, chloe`
    #[must_use]
    pub fn names(&self) -> Seq<String> {
        names_source().log("names")
    }

    /// `alex`
    #[must_use]
    pub fn name(&self) -> Opt<String> {
        Opt::just("alex".to_string())
    }

    /// Upper-cased names longer than `length`, prefixed with their length:
    /// `4-ALEX, 5-CHLOE` for 3.
    #[must_use]
    pub fn names_map(&self, length: usize) -> Seq<String> {
        upper_longer_than(names_source(), length)
            .map(|name| format!("{}-{name}", name.len()))
            .log("names_map")
    }

    /// Operators return new sequences; the source is left untouched, so this
    /// still emits lower-case names.
    #[must_use]
    pub fn names_immutable(&self) -> Seq<String> {
        let names = names_source();
        let _upper = names.clone().map(|name| name.to_uppercase());
        names
    }

    /// Letters of the upper-cased names longer than `length`.
    #[must_use]
    pub fn names_flat_map(&self, length: usize) -> Seq<String> {
        upper_longer_than(names_source(), length)
            .flat_map(|name| split_string(&name))
            .log("names_flat_map")
    }

    /// Like [`names_flat_map`](Self::names_flat_map) with delayed letters;
    /// letters of different names interleave.
    #[must_use]
    pub fn names_flat_map_async(&self, length: usize) -> Seq<String> {
        upper_longer_than(names_source(), length)
            .flat_map(self.splitter())
            .log("names_flat_map_async")
    }

    /// Like [`names_flat_map_async`](Self::names_flat_map_async) but the
    /// letters stay in name order.
    #[must_use]
    pub fn names_concat_map(&self, length: usize) -> Seq<String> {
        upper_longer_than(names_source(), length)
            .concat_map(self.splitter())
            .log("names_concat_map")
    }

    /// The letters of `ALEX` as a single list, or empty if `alex` is not
    /// longer than `length`.
    #[must_use]
    pub fn name_flat_map(&self, length: usize) -> Opt<Vec<String>> {
        self.upper_name_longer_than(length)
            .flat_map(|name| Opt::just(name.chars().map(String::from).collect::<Vec<_>>()))
            .log("name_flat_map")
    }

    /// The letters of `ALEX` as a sequence.
    #[must_use]
    pub fn name_flat_map_many(&self, length: usize) -> Seq<String> {
        self.upper_name_longer_than(length)
            .flat_map_many(|name| split_string(&name))
            .log("name_flat_map_many")
    }

    fn upper_name_longer_than(&self, length: usize) -> Opt<String> {
        self.name()
            .map(|name| name.to_uppercase())
            .filter(move |name| name.len() > length)
    }

    /// Letters of the long names, or `default` if none is long enough.
    #[must_use]
    pub fn names_transform(&self, length: usize) -> Seq<String> {
        let filter_map = move |names: Seq<String>| upper_longer_than(names, length);

        names_source()
            .transform(filter_map)
            .flat_map(|name| split_string(&name))
            .default_if_empty("default".to_string())
            .log("names_transform")
    }

    /// Letters of the long names, or the letters of `DEFAULT` if none is
    /// long enough.
    #[must_use]
    pub fn names_transform_switch_if_empty(&self, length: usize) -> Seq<String> {
        let filter_map =
            move |names: Seq<String>| upper_longer_than(names, length).flat_map(|name| split_string(&name));
        let fallback = Seq::just("default".to_string()).transform(filter_map);

        names_source()
            .transform(filter_map)
            .switch_if_empty(fallback)
            .log("names_transform_switch_if_empty")
    }

    /// `A, B, C, D, E, F` via [`concat`]
    #[must_use]
    pub fn explore_concat(&self) -> Seq<String> {
        concat([letters(&["A", "B", "C"]), letters(&["D", "E", "F"])]).log("explore_concat")
    }

    /// `A, B, C, D, E, F` via [`Seq::concat_with`]
    #[must_use]
    pub fn explore_concat_with(&self) -> Seq<String> {
        letters(&["A", "B", "C"])
            .concat_with(letters(&["D", "E", "F"]))
            .log("explore_concat_with")
    }

    /// `A, B` from two `Opt`s
    #[must_use]
    pub fn explore_concat_with_opt(&self) -> Seq<String> {
        Opt::just("A".to_string())
            .concat_with(Opt::just("B".to_string()))
            .log("explore_concat_with_opt")
    }

    fn delayed_abc() -> Seq<String> {
        letters(&["A", "B", "C"]).delay_elements(ABC_DELAY)
    }

    fn delayed_def() -> Seq<String> {
        letters(&["D", "E", "F"]).delay_elements(DEF_DELAY)
    }

    /// `A, D, B, E, C, F`: two delayed sources merged by emission time
    #[must_use]
    pub fn explore_merge(&self) -> Seq<String> {
        merge([Self::delayed_abc(), Self::delayed_def()]).log("explore_merge")
    }

    /// Same as [`explore_merge`](Self::explore_merge) via [`Seq::merge_with`]
    #[must_use]
    pub fn explore_merge_with(&self) -> Seq<String> {
        Self::delayed_abc()
            .merge_with(Self::delayed_def())
            .log("explore_merge_with")
    }

    /// `A, B` from two `Opt`s
    #[must_use]
    pub fn explore_merge_with_opt(&self) -> Seq<String> {
        Opt::just("A".to_string())
            .merge_with(Opt::just("B".to_string()))
            .log("explore_merge_with_opt")
    }

    /// `A, B, C, D, E, F`: both sources run at once, output kept in order
    #[must_use]
    pub fn explore_merge_sequential(&self) -> Seq<String> {
        merge_sequential([Self::delayed_abc(), Self::delayed_def()]).log("explore_merge_sequential")
    }

    /// `AD, BE, CF`
    #[must_use]
    pub fn explore_zip(&self) -> Seq<String> {
        zip(letters(&["A", "B", "C"]), letters(&["D", "E", "F"]), |first, second| {
            first + &second
        })
        .log("explore_zip")
    }

    /// `AD14, BE25, CF36`
    #[must_use]
    pub fn explore_zip_4(&self) -> Seq<String> {
        zip_all(
            [
                letters(&["A", "B", "C"]),
                letters(&["D", "E", "F"]),
                letters(&["1", "2", "3"]),
                letters(&["4", "5", "6"]),
            ],
            |parts| parts.concat(),
        )
        .log("explore_zip_4")
    }

    /// `AD, BE, CF` via [`Seq::zip_with`]
    #[must_use]
    pub fn explore_zip_with(&self) -> Seq<String> {
        letters(&["A", "B", "C"])
            .zip_with(letters(&["D", "E", "F"]), |first, second| first + &second)
            .log("explore_zip_with")
    }

    /// `AB` from two `Opt`s
    #[must_use]
    pub fn explore_zip_with_opt(&self) -> Opt<String> {
        Opt::just("A".to_string())
            .zip_with(Opt::just("B".to_string()), |first, second| first + &second)
            .log("explore_zip_with_opt")
    }
}
