//! Enumerated SCPI parameters.
//!
//! Each parameter has a symbolic name, used for parsing user input and for display, and a wire
//! token, which is what the instrument accepts and what it returns from a query. Both lookups
//! are exact and case-sensitive.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

macro_rules! scpi_enum {
    {
        $( #[$attr:meta] )*
        pub enum $name:ident as $table:literal {
            $( $( #[$variant_attr:meta] )* $variant:ident => ($symbol:literal, $token:literal), )*
        }
        $( $rest:tt )*
    } => {
        $( #[$attr] )*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $( #[$variant_attr] )* $variant, )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )* ];

            pub fn symbol(self) -> &'static str {
                match self {
                    $( Self::$variant => $symbol, )*
                }
            }

            pub fn token(self) -> &'static str {
                match self {
                    $( Self::$variant => $token, )*
                }
            }

            /// Map a token returned by the instrument back to a parameter value.
            pub fn from_token(token: &str) -> Result<$name> {
                match token {
                    $( $token => Ok(Self::$variant), )*
                    _ => Err(Error::UnknownResponse { table: $table, response: token.to_owned() })
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(symbol: &str) -> Result<$name> {
                match symbol {
                    $( $symbol => Ok(Self::$variant), )*
                    _ => Err(Error::InvalidOption { table: $table, option: symbol.to_owned() })
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.symbol())
            }
        }

        scpi_enum! { $( $rest )* }
    };
    {} => {}
}

scpi_enum! {
    /// Output waveform shape.
    pub enum Function as "function" {
        Sine => ("sine", "SIN"),
        Square => ("square", "SQU"),
        Pulse => ("pulse", "PULS"),
        Ramp => ("ramp", "RAMP"),
        Noise => ("noise", "PRN"),
        Dc => ("dc", "DC"),
        Sinc => ("sinc", "SINC"),
        Gaussian => ("gaussian", "GAUS"),
        Lorentz => ("lorentz", "LOR"),
        ExpRise => ("exp_rise", "ERIS"),
        ExpDecay => ("exp_decay", "EDEC"),
        Haversine => ("haversine", "HAV"),
        /// The only edit memory of an instrument without numbered edit memories.
        EditMemory => ("emem", "EMEM"),
        EditMemory1 => ("emem1", "EMEM1"),
        EditMemory2 => ("emem2", "EMEM2"),
        EditFile => ("efile", "EFIL"),
    }

    /// Event that starts a burst.
    pub enum TriggerSource as "trigger source" {
        Timer => ("timer", "TIM"),
        External => ("external", "EXT"),
    }

    pub enum BurstMode as "burst mode" {
        /// Output the configured number of cycles on every trigger.
        Triggered => ("triggered", "TRIG"),
        /// Output while the external gate signal is asserted.
        Gated => ("gated", "GAT"),
    }

    /// Pulse parameter held constant when the period changes.
    pub enum PulseHold as "pulse hold" {
        Width => ("width", "WIDT"),
        Duty => ("duty", "DUTY"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditMemory {
    One,
    Two,
}

impl EditMemory {
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Edit memory conventionally used by the channel with the given number.
    pub fn for_channel(channel: u8) -> Result<EditMemory> {
        match channel {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            _ => Err(Error::InvalidArgument(format!("no edit memory for channel {}", channel)))
        }
    }

    /// Waveform function that plays back this memory.
    pub fn function(self, numbered: bool) -> Function {
        match (numbered, self) {
            (false, _)        => Function::EditMemory,
            (true, Self::One) => Function::EditMemory1,
            (true, Self::Two) => Function::EditMemory2,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn assert_table<T>(all: &[T], symbol: fn(T) -> &'static str, token: fn(T) -> &'static str)
            where T: Copy {
        let symbols: HashSet<_> = all.iter().map(|&value| symbol(value)).collect();
        let tokens: HashSet<_> = all.iter().map(|&value| token(value)).collect();
        assert_eq!(symbols.len(), all.len());
        assert_eq!(tokens.len(), all.len());
    }

    #[test]
    fn tables_are_bijective() {
        assert_table(Function::ALL, Function::symbol, Function::token);
        assert_table(TriggerSource::ALL, TriggerSource::symbol, TriggerSource::token);
        assert_table(BurstMode::ALL, BurstMode::symbol, BurstMode::token);
        assert_table(PulseHold::ALL, PulseHold::symbol, PulseHold::token);
    }

    #[test]
    fn lookups() {
        for &function in Function::ALL {
            assert_eq!(function.symbol().parse::<Function>().unwrap(), function);
            assert_eq!(Function::from_token(function.token()).unwrap(), function);
        }
        assert_eq!("external".parse::<TriggerSource>().unwrap(), TriggerSource::External);
        assert_eq!(BurstMode::from_token("GAT").unwrap(), BurstMode::Gated);
        assert_eq!(PulseHold::Duty.to_string(), "duty");
    }

    #[test]
    fn lookups_are_exact() {
        assert!(matches!("Sine".parse::<Function>(),
                         Err(Error::InvalidOption { table: "function", .. })));
        assert!(matches!("triangle".parse::<Function>(), Err(Error::InvalidOption { .. })));
        assert!(matches!(Function::from_token("sin"), Err(Error::UnknownResponse { .. })));
        assert!(matches!(TriggerSource::from_token("MAN"),
                         Err(Error::UnknownResponse { table: "trigger source", .. })));
    }

    #[test]
    fn edit_memory() {
        assert_eq!(EditMemory::for_channel(2).unwrap(), EditMemory::Two);
        assert!(matches!(EditMemory::for_channel(3), Err(Error::InvalidArgument(_))));
        assert_eq!(EditMemory::Two.function(true), Function::EditMemory2);
        assert_eq!(EditMemory::Two.function(false), Function::EditMemory);
    }
}
