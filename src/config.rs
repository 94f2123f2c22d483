//! Contains constants and other configuration information affecting default & fixed behaviors of this library

use std::ops::RangeInclusive;
use strum::FromRepr;


/// The configuration used by `observe_on()` -- see [ConstConfig::default()]
pub const DEFAULT_CONFIG: u64 = ConstConfig::default().into();


/// Specifies how `observe_on()` schedules the delivery of its queued notifications
#[derive(Debug,PartialEq,Clone,Copy,FromRepr)]
pub enum DrainModes {
    /// A single scheduled task delivers everything pending at the time it runs -- the fastest option
    Batched,
    /// One scheduled task per notification: lets other tasks sharing the scheduler run between deliveries
    /// -- fairer on shared pools, at the cost of throughput
    PerItem,
}

/// Specifies how to behave when the `observe_on()` queue is full -- the producer being faster than the scheduler
#[derive(Debug,PartialEq,Clone,Copy)]
pub enum OverflowStrategies {

    /// Never drops anything, letting the queue grow without bounds -- [ConstConfig::observe_on_buffer] is ignored
    Unbounded,

    /// Drops the item being enqueued, keeping the ones already there
    DropNewest,

    /// Drops the item at the head of the queue, making room for the new one
    DropOldest,

    /// Yields the producer's thread for up to the specified milliseconds, waiting for the queue to have room.
    /// If it doesn't happen in time, falls back to [Self::DropNewest]
    WaitForUpToMillis(u8),
}
impl OverflowStrategies {
    /// requires 3+8=11 bits to represent the data; reverse of [Self::from_repr()]
    const fn as_repr(&self) -> u16 {
        match self {
            Self::Unbounded                   => 0,
            Self::DropNewest                  => 1,
            Self::DropOldest                  => 2,
            Self::WaitForUpToMillis(millis) => 3 | (*millis as u16) << 3,
        }
    }
    /// reverse of [Self::as_repr()]
    const fn from_repr(repr: u16) -> Self {
        let (variant, n) = (repr & 7, repr >> 3);
        match variant {
            0 => Self::Unbounded,
            1 => Self::DropNewest,
            2 => Self::DropOldest,
            3 => Self::WaitForUpToMillis(n as u8),
            _ => unreachable!(),    // If this errors, was a new enum member added?
        }
    }
}


/// Implements the "Zero-Cost Const Configuration Pattern", producing a `u64` meant to be the only const parameter
/// of generic functions & structs (instead of bloating them with several const params).\
/// When using the const "query functions" defined here in `if`s, the compiler has the opportunity to
/// cancel out any unreachable code.\
/// Usage example:
/// ```nocompile
///     const CONFIG: u64 = ConstConfig {
///         observe_on_buffer: 64,
///         overflow_strategy: OverflowStrategies::DropOldest,
///         ..ConstConfig::default()
///     }.into();
///     let ui_updates = prices.observe_on_configured::<CONFIG, _>(ui_scheduler);
#[derive(Debug,PartialEq)]
pub struct ConstConfig {
    /// How many notifications (per subscription) may wait in the `observe_on()` queue (power of 2)
    /// before the [Self::overflow_strategy] kicks in
    pub observe_on_buffer: u32,
    /// What to do when the queue is full
    pub overflow_strategy: OverflowStrategies,
    /// How queued notifications are handed over to the scheduler
    pub drain_mode: DrainModes,
}

impl ConstConfig {

    // the consts here determine what bits they use

    /// u32_value = 2^n
    const OBSERVE_ON_BUFFER: RangeInclusive<usize> = 0..=4;
    /// One of [OverflowStrategies], converted by [OverflowStrategies::as_repr()]
    const OVERFLOW_STRATEGY: RangeInclusive<usize> = 5..=15;
    /// One of [DrainModes], as its discriminant
    const DRAIN_MODE: RangeInclusive<usize> = 16..=17;


    /// Contains sane & performant defaults.\
    /// Usage example:
    /// ```nocompile
    ///  const CONFIG: ConstConfig = ConstConfig {
    ///     observe_on_buffer: 4096,
    ///     ..ConstConfig::default()
    /// };
    pub const fn default() -> ConstConfig {
        ConstConfig {
            observe_on_buffer: 1024,
            overflow_strategy: OverflowStrategies::WaitForUpToMillis(10),
            drain_mode:        DrainModes::Batched,
        }
    }

    /// Packs this configuration into the `u64` used as a const generic parameter.\
    /// See also [Self::from()]
    pub const fn into(self) -> u64 {
        let mut config = 0u64;
        config = set_bits_from_power_of_2_u32(config, Self::OBSERVE_ON_BUFFER, self.observe_on_buffer);
        let overflow_strategy_repr = self.overflow_strategy.as_repr();
        config = set_bits(config, Self::OVERFLOW_STRATEGY, overflow_strategy_repr as u64);
        let drain_mode_repr = self.drain_mode as u8;
        config = set_bits(config, Self::DRAIN_MODE, drain_mode_repr as u64);
        config
    }

    /// Builds [Self] from the generic `const CONFIG: u64` parameter used by the "Const Config Pattern"
    pub const fn from(config: u64) -> Self {
        let observe_on_buffer      = get_power_of_2_u32_bits(config, Self::OBSERVE_ON_BUFFER);
        let overflow_strategy_repr = get_bits(config, Self::OVERFLOW_STRATEGY);
        let drain_mode_repr        = get_bits(config, Self::DRAIN_MODE);
        Self {
            observe_on_buffer,
            overflow_strategy: OverflowStrategies::from_repr(overflow_strategy_repr as u16),
            drain_mode:        if let Some(drain_mode) = DrainModes::from_repr(drain_mode_repr as usize) {drain_mode} else {DrainModes::Batched},
        }
    }

    // query functions
    //////////////////
    // to be used where the generic `const CONFIG: u64` resides

    pub const fn extract_observe_on_buffer(config: u64) -> u32 {
        Self::from(config).observe_on_buffer
    }

    pub const fn extract_overflow_strategy(config: u64) -> OverflowStrategies {
        Self::from(config).overflow_strategy
    }

    pub const fn extract_drain_mode(config: u64) -> DrainModes {
        Self::from(config).drain_mode
    }
}

/// Helper for retrieving data (other than simple flags) from the configuration
/// -- as stored in the specified `bits` by [set_bits()]
const fn get_bits(config: u64, bits: RangeInclusive<usize>) -> u64 {
    let bits_len = *bits.end()-*bits.start()+1;
    (config>>*bits.start()) & ((1<<bits_len)-1)
}

/// Helper for storing data (other than simple flags) in the configuration
/// -- stored in the specified `bits`.\
/// `value` should not be higher than what fits in the bits.\
/// Returns the `config` with the `value` applied to it in a way it may be retrieved by [get_bits()]
const fn set_bits(mut config: u64, bits: RangeInclusive<usize>, value: u64) -> u64 {
    let bits_len = *bits.end()-*bits.start()+1;
    if value > (1<<bits_len)-1 {
        // "The value specified is above the maximum the reserved bits for it can take"
        unreachable!();
    } else {
        config &= !( ((1<<bits_len)-1) << *bits.start() );   // clear the target bits
        config |= value << *bits.start();                    // set them
        config
    }
}

/// Retrieves 5 `bits` from `config` that represents a power of 2 over the `u32` space
const fn get_power_of_2_u32_bits(config: u64, bits: RangeInclusive<usize>) -> u32 {
    let value = get_bits(config, bits);
    1 << value
}

/// Packs, optimally, the `power_of_2_u32_value` into 5 `bits`, returning the new value for the given `config`
const fn set_bits_from_power_of_2_u32(config: u64, bits: RangeInclusive<usize>, power_of_2_u32_value: u32) -> u64 {
    if power_of_2_u32_value.is_power_of_two() {
        set_bits(config, bits, power_of_2_u32_value.ilog2() as u64)
    } else {
        // "The value must be a power of 2"
        unreachable!();
    }
}


/// Unit tests & enforces the requisites of the [config](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;

    #[cfg_attr(not(doc),test)]
    fn overflow_strategies_repr() {
        let subjects = vec![
            vec![
                OverflowStrategies::Unbounded,
                OverflowStrategies::DropNewest,
                OverflowStrategies::DropOldest,
            ].into_iter(),
            (0..8).map(|n| OverflowStrategies::WaitForUpToMillis(1<<n)).collect::<Vec<_>>().into_iter(),
        ].into_iter().flatten();

        for expected in subjects {
            let converted = OverflowStrategies::as_repr(&expected);
            let reconverted = OverflowStrategies::from_repr(converted);
            assert_eq!(reconverted, expected, "FAILED: {:?} (repr: 0x{:x}); reconverted: {:?}", expected, converted, reconverted);
        }
    }

    #[cfg_attr(not(doc),test)]
    fn const_config_packing() {
        let expected = ConstConfig {
            observe_on_buffer: 1 << 31,
            overflow_strategy: OverflowStrategies::WaitForUpToMillis(255),
            drain_mode:        DrainModes::PerItem,
        };
        let packed = ConstConfig { ..expected }.into();
        assert_eq!(ConstConfig::from(packed), expected);
        assert_eq!(ConstConfig::extract_observe_on_buffer(packed), 1 << 31);
        assert_eq!(ConstConfig::extract_drain_mode(packed), DrainModes::PerItem);

        assert_eq!(ConstConfig::from(DEFAULT_CONFIG), ConstConfig::default());
        assert_eq!(ConstConfig::extract_overflow_strategy(DEFAULT_CONFIG), OverflowStrategies::WaitForUpToMillis(10));
    }

    #[cfg_attr(not(doc),test)]
    #[should_panic]
    fn buffers_must_be_powers_of_2() {
        let _ = ConstConfig { observe_on_buffer: 1000, ..ConstConfig::default() }.into();
    }
}
