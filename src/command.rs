use std::{fmt::Display, str::FromStr};

use itertools::Itertools;

use crate::error::Error;

macro_rules! verbs {
    ($($(#[$doc:meta])* $verb:ident,)*) => {
        /// The keyword a command line starts with.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Verb {
            $($(#[$doc])* $verb,)*
        }

        impl Verb {
            /// Every verb the car understands.
            pub const ALL: &'static [Verb] = &[$(Verb::$verb,)*];

            /// The verb as it goes on the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Verb::$verb => stringify!($verb),)*
                }
            }
        }
    };
}

verbs! {
    /// Firmware API version.
    GetAPIVersion,
    /// One of the two push switches.
    ReadSwitch,
    /// One of the eight IR distance sensors.
    ReadIR,
    /// One of the two line sensors.
    ReadLine,
    /// Ambient light.
    ReadLight,
    /// Microphone level.
    ReadMic,
    /// Accelerometer axis. Signed.
    ReadAxis,
    /// Left and right motor speeds.
    SetMotors,
    /// Drive forwards a number of millimetres.
    Forwards,
    /// Drive backwards a number of millimetres.
    Backwards,
    /// Turn left a number of degrees.
    Left,
    /// Turn right a number of degrees.
    Right,
    /// All eight LEDs as a bit pattern.
    LEDWrite,
    /// A single LED on.
    LEDOn,
    /// A single LED off.
    LEDOff,
    /// A tone of some frequency and duration.
    PlayNote,
    /// Start driving a servo.
    ServoEnable,
    /// Stop driving a servo.
    ServoDisable,
    /// Jump a servo to a position.
    ServoSetPos,
    /// Move a servo to a position at the auto-move speed.
    ServoAutoMove,
    /// The auto-move speed.
    ServoMoveSpeed,
    /// Blank the display.
    LCDClear,
    /// Text at a position.
    LCDPrint,
    /// A number at a position.
    LCDNumber,
    /// A single pixel.
    LCDPixel,
    /// A line between two points.
    LCDLine,
    /// A rectangle between two corners.
    LCDRect,
    /// Backlight brightness.
    LCDBacklight,
    /// Colours and transparency.
    LCDOptions,
    /// Whether the display echoes received commands.
    LCDVerbose,
    /// Mount the SD card.
    CardInit,
    /// Create a file.
    CardCreate,
    /// Open a file.
    CardOpen,
    /// Delete a file.
    CardDelete,
    /// Append a byte to the open file.
    CardWriteByte,
    /// Read the next byte of the open file.
    CardReadByte,
    /// Record the microphone into a file.
    CardRecordMic,
    /// Play a recorded file.
    CardPlayback,
    /// Draw a bitmap file on the display.
    CardBitmap,
}

impl Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .iter()
            .find(|verb| verb.as_str() == s)
            .copied()
            .ok_or_else(|| Error::UnknownVerb(s.to_string()))
    }
}

/// A single argument following the verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Rendered in base 10.
    Int(i64),

    /// Rendered verbatim.
    ///
    /// Spaces and control characters are not escaped.
    /// The firmware splits on spaces, so `"my file"` arrives as two tokens.
    Text(String),
}

impl Display for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Int(value) => write!(f, "{value}"),
            Arg::Text(text) => f.write_str(text),
        }
    }
}

macro_rules! int_args {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg {
            fn from(value: $t) -> Self {
                Arg::Int(value.into())
            }
        })*
    };
}

int_args!(u8, i8, u16, i16, u32, i32, i64);

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Int(value.into())
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

impl FromStr for Arg {
    type Err = std::convert::Infallible;

    /// Anything that parses as an integer is one, the rest is text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(Arg::Int)
            .unwrap_or_else(|_| Arg::Text(s.to_string())))
    }
}

/// A verb plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    args: Vec<Arg>,
}

impl Command {
    /// A command with no arguments (yet).
    pub fn new(verb: Verb) -> Self {
        Self { verb, args: vec![] }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<A: Into<Arg>>(mut self, args: impl IntoIterator<Item = A>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The verb.
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// The arguments.
    pub fn arguments(&self) -> &[Arg] {
        &self.args
    }

    /// The command exactly as written to the wire, newline included.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.verb)
        } else {
            write!(f, "{} {}", self.verb, self.args.iter().join(" "))
        }
    }
}

impl From<Verb> for Command {
    fn from(verb: Verb) -> Self {
        Self::new(verb)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bare_verb() {
        assert_eq!(Command::new(Verb::ReadLight).to_line(), "ReadLight\n");
    }

    #[test]
    fn text_is_not_escaped() {
        let command = Command::new(Verb::LCDPrint)
            .arg(10)
            .arg(5)
            .arg("hello world");

        assert_eq!(command.to_line(), "LCDPrint 10 5 hello world\n");
    }

    #[test]
    fn negative_numbers_are_plain_decimal() {
        let command = Command::new(Verb::LCDNumber).args([0i16, 8, -32768]);

        assert_eq!(command.to_string(), "LCDNumber 0 8 -32768");
    }

    #[test]
    fn verbs_round_trip_through_their_wire_name() {
        for verb in Verb::ALL {
            assert_eq!(verb.as_str().parse::<Verb>().unwrap(), *verb);
        }
    }

    #[test]
    fn verbs_are_case_sensitive() {
        assert!(matches!(
            "readir".parse::<Verb>(),
            Err(Error::UnknownVerb(v)) if v == "readir"
        ));
    }

    #[test]
    fn cli_arguments_become_ints_when_they_can() {
        assert_eq!("-12".parse::<Arg>().unwrap(), Arg::Int(-12));
        assert_eq!("song.wav".parse::<Arg>().unwrap(), Arg::Text("song.wav".into()));
    }
}
