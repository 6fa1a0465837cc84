//! The car's command set, on top of [`CommandChannel`].
//!
//! Commands which report back are given a budget of read attempts.
//! Sensor reads answer right away. Movement answers once the car has
//! stopped, so the budget grows with the distance or angle asked for.
//! A [`Error::NoResponse`] from a movement therefore does not mean the car
//! did not move, only that it did not say so in time.

use std::time::Duration;

use tokio_serial::SerialStream;

use crate::{
    channel::CommandChannel,
    command::{Arg, Command, Verb},
    error::Error,
    serial::Device,
};

/// A channel to a car over a real serial port.
pub type Car = CommandChannel<SerialStream>;

/// Attempts for a reading which the car answers straight away.
pub const SENSOR_BUDGET: u32 = 1;

/// Attempts for SD card bookkeeping.
pub const CARD_BUDGET: u32 = 2;

/// Attempts for drawing a bitmap from the SD card.
pub const BITMAP_BUDGET: u32 = 5;

/// Attempts for playing back a recording.
pub const PLAYBACK_BUDGET: u32 = 50;

/// Roughly how far the car drives per read attempt, in millimetres.
pub const MM_PER_ATTEMPT: u16 = 50;

/// Roughly how far the car turns per read attempt, in degrees.
pub const DEGREES_PER_ATTEMPT: u16 = 45;

/// Attempts to wait for a movement of `amount`, at least one.
pub fn motion_budget(amount: u16, per_attempt: u16) -> u32 {
    u32::from(amount / per_attempt).max(1)
}

/// Attempts to wait for a microphone recording of `seconds`.
pub fn recording_budget(seconds: u16) -> u32 {
    u32::from(seconds) + 1
}

/// Display colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcdColour {
    /// 0 on the wire.
    White,
    /// 1 on the wire.
    Black,
}

impl From<LcdColour> for Arg {
    fn from(colour: LcdColour) -> Self {
        match colour {
            LcdColour::White => Arg::Int(0),
            LcdColour::Black => Arg::Int(1),
        }
    }
}

/// Sensor readings.
impl<D: Device> CommandChannel<D> {
    /// The API version implemented by the car's firmware.
    pub async fn api_version(&mut self) -> Result<i32, Error> {
        self.request(Command::new(Verb::GetAPIVersion), SENSOR_BUDGET)
            .await
    }

    /// Switch 0 (left) or 1 (right). Pressed is 1.
    pub async fn read_switch(&mut self, index: u8) -> Result<i32, Error> {
        self.request(Command::new(Verb::ReadSwitch).arg(index), SENSOR_BUDGET)
            .await
    }

    /// IR sensor 0 to 7, from 0 to 4095.
    pub async fn read_ir(&mut self, index: u8) -> Result<i32, Error> {
        self.request(Command::new(Verb::ReadIR).arg(index), SENSOR_BUDGET)
            .await
    }

    /// Line sensor 0 or 1, from 0 to 4095.
    pub async fn read_line(&mut self, index: u8) -> Result<i32, Error> {
        self.request(Command::new(Verb::ReadLine).arg(index), SENSOR_BUDGET)
            .await
    }

    /// Ambient light, from 0 to 4095.
    pub async fn read_light(&mut self) -> Result<i32, Error> {
        self.request(Command::new(Verb::ReadLight), SENSOR_BUDGET)
            .await
    }

    /// Microphone level, from 0 to 4095.
    pub async fn read_mic(&mut self) -> Result<i32, Error> {
        self.request(Command::new(Verb::ReadMic), SENSOR_BUDGET).await
    }

    /// Accelerometer axis, from -32768 to 32767.
    pub async fn read_axis(&mut self, index: u8) -> Result<i32, Error> {
        self.request(Command::new(Verb::ReadAxis).arg(index), SENSOR_BUDGET)
            .await
    }
}

/// Movement.
impl<D: Device> CommandChannel<D> {
    /// Set both motor speeds and return immediately.
    pub async fn set_motors(&mut self, left: i8, right: i8) -> Result<(), Error> {
        self.post(Command::new(Verb::SetMotors).arg(left).arg(right))
            .await
    }

    /// Drive forwards `distance` millimetres and wait for the car to report back.
    pub async fn forwards(&mut self, distance: u16) -> Result<i32, Error> {
        let budget = motion_budget(distance, MM_PER_ATTEMPT);
        self.request(Command::new(Verb::Forwards).arg(distance), budget)
            .await
    }

    /// Drive backwards `distance` millimetres and wait for the car to report back.
    pub async fn backwards(&mut self, distance: u16) -> Result<i32, Error> {
        let budget = motion_budget(distance, MM_PER_ATTEMPT);
        self.request(Command::new(Verb::Backwards).arg(distance), budget)
            .await
    }

    /// Turn left `angle` degrees and wait for the car to report back.
    pub async fn left(&mut self, angle: u16) -> Result<i32, Error> {
        let budget = motion_budget(angle, DEGREES_PER_ATTEMPT);
        self.request(Command::new(Verb::Left).arg(angle), budget).await
    }

    /// Turn right `angle` degrees and wait for the car to report back.
    pub async fn right(&mut self, angle: u16) -> Result<i32, Error> {
        let budget = motion_budget(angle, DEGREES_PER_ATTEMPT);
        self.request(Command::new(Verb::Right).arg(angle), budget).await
    }
}

/// LEDs, servos and sound.
impl<D: Device> CommandChannel<D> {
    /// Set all eight LEDs from the bits of `value`.
    pub async fn led_write(&mut self, value: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::LEDWrite).arg(value)).await
    }

    /// Turn LED 0 to 7 on.
    pub async fn led_on(&mut self, index: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::LEDOn).arg(index)).await
    }

    /// Turn LED 0 to 7 off.
    pub async fn led_off(&mut self, index: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::LEDOff).arg(index)).await
    }

    /// Play `frequency` Hz for `length_ms` milliseconds.
    ///
    /// The car does not answer, so this sleeps for the duration of the note
    /// to keep the next command from cutting it short.
    pub async fn play_note(&mut self, frequency: u16, length_ms: u16) -> Result<(), Error> {
        self.post(Command::new(Verb::PlayNote).arg(frequency).arg(length_ms))
            .await?;
        tokio::time::sleep(Duration::from_millis(length_ms.into())).await;

        Ok(())
    }

    /// A rising sweep from 100 Hz to 1 kHz.
    pub async fn play_start_sound(&mut self) -> Result<(), Error> {
        for step in 1..=10 {
            self.sweep_step(step).await?;
        }
        Ok(())
    }

    /// A falling sweep from 1 kHz to 100 Hz.
    pub async fn play_end_sound(&mut self) -> Result<(), Error> {
        for step in (1..=10).rev() {
            self.sweep_step(step).await?;
        }
        Ok(())
    }

    async fn sweep_step(&mut self, step: u16) -> Result<(), Error> {
        self.play_note(step * 100, 10).await?;
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(())
    }

    /// Start driving servo 0 to 3.
    pub async fn servo_enable(&mut self, index: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::ServoEnable).arg(index)).await
    }

    /// Stop driving servo 0 to 3.
    pub async fn servo_disable(&mut self, index: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::ServoDisable).arg(index)).await
    }

    /// Move a servo to `position` immediately.
    pub async fn servo_set_pos(&mut self, index: u8, position: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::ServoSetPos).arg(index).arg(position))
            .await
    }

    /// Move a servo towards `position` at the auto-move speed.
    pub async fn servo_auto_move(&mut self, index: u8, position: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::ServoAutoMove).arg(index).arg(position))
            .await
    }

    /// The auto-move speed, 1 to 50.
    pub async fn servo_move_speed(&mut self, speed: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::ServoMoveSpeed).arg(speed)).await
    }
}

/// The 128x32 display.
impl<D: Device> CommandChannel<D> {
    /// Blank the display.
    pub async fn lcd_clear(&mut self) -> Result<(), Error> {
        self.post(Command::new(Verb::LCDClear)).await
    }

    /// Print `text` with its top left at (`x`, `y`).
    ///
    /// The text is sent as is. It must not contain a newline.
    pub async fn lcd_print(&mut self, x: u8, y: u8, text: &str) -> Result<(), Error> {
        self.post(Command::new(Verb::LCDPrint).arg(x).arg(y).arg(text))
            .await
    }

    /// Print a number with its top left at (`x`, `y`).
    pub async fn lcd_number(&mut self, x: u8, y: u8, value: i16) -> Result<(), Error> {
        self.post(Command::new(Verb::LCDNumber).arg(x).arg(y).arg(value))
            .await
    }

    /// Set or clear a single pixel.
    pub async fn lcd_pixel(&mut self, x: u8, y: u8, on: bool) -> Result<(), Error> {
        self.post(Command::new(Verb::LCDPixel).arg(x).arg(y).arg(on))
            .await
    }

    /// Draw a line from (`x1`, `y1`) to (`x2`, `y2`).
    pub async fn lcd_line(&mut self, x1: u8, y1: u8, x2: u8, y2: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::LCDLine).args([x1, y1, x2, y2]))
            .await
    }

    /// Draw a rectangle with corners (`x1`, `y1`) and (`x2`, `y2`).
    pub async fn lcd_rect(&mut self, x1: u8, y1: u8, x2: u8, y2: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::LCDRect).args([x1, y1, x2, y2]))
            .await
    }

    /// Backlight brightness, 0 to 100.
    pub async fn lcd_backlight(&mut self, brightness: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::LCDBacklight).arg(brightness))
            .await
    }

    /// Colours used by subsequent drawing.
    pub async fn lcd_options(
        &mut self,
        foreground: LcdColour,
        background: LcdColour,
        transparent: bool,
    ) -> Result<(), Error> {
        self.post(
            Command::new(Verb::LCDOptions)
                .arg(foreground)
                .arg(background)
                .arg(transparent),
        )
        .await
    }

    /// Make the display echo every command the car receives.
    pub async fn lcd_verbose(&mut self, on: bool) -> Result<(), Error> {
        self.post(Command::new(Verb::LCDVerbose).arg(on)).await
    }
}

/// The SD card.
///
/// Filenames are sent verbatim, so they must not contain spaces.
impl<D: Device> CommandChannel<D> {
    /// Mount the card.
    pub async fn card_init(&mut self) -> Result<i32, Error> {
        self.request(Command::new(Verb::CardInit), CARD_BUDGET).await
    }

    /// Create a file.
    pub async fn card_create(&mut self, filename: &str) -> Result<i32, Error> {
        self.request(Command::new(Verb::CardCreate).arg(filename), CARD_BUDGET)
            .await
    }

    /// Open a file for reading and writing bytes.
    pub async fn card_open(&mut self, filename: &str) -> Result<i32, Error> {
        self.request(Command::new(Verb::CardOpen).arg(filename), CARD_BUDGET)
            .await
    }

    /// Delete a file.
    pub async fn card_delete(&mut self, filename: &str) -> Result<i32, Error> {
        self.request(Command::new(Verb::CardDelete).arg(filename), CARD_BUDGET)
            .await
    }

    /// Write a byte to the open file. Not acknowledged.
    pub async fn card_write_byte(&mut self, data: u8) -> Result<(), Error> {
        self.post(Command::new(Verb::CardWriteByte).arg(data)).await
    }

    /// Read the next byte of the open file.
    pub async fn card_read_byte(&mut self) -> Result<i32, Error> {
        self.request(Command::new(Verb::CardReadByte), CARD_BUDGET)
            .await
    }

    /// Record `seconds` of microphone input to `filename`.
    pub async fn card_record_mic(
        &mut self,
        bit_depth: u8,
        sample_rate: u32,
        seconds: u16,
        filename: &str,
    ) -> Result<i32, Error> {
        let command = Command::new(Verb::CardRecordMic)
            .arg(bit_depth)
            .arg(sample_rate)
            .arg(seconds)
            .arg(filename);

        self.request(command, recording_budget(seconds)).await
    }

    /// Play back a recording.
    pub async fn card_playback(&mut self, filename: &str) -> Result<i32, Error> {
        self.request(Command::new(Verb::CardPlayback).arg(filename), PLAYBACK_BUDGET)
            .await
    }

    /// Draw a bitmap file with its top left at (`x`, `y`).
    pub async fn card_bitmap(&mut self, x: u8, y: u8, filename: &str) -> Result<i32, Error> {
        self.request(
            Command::new(Verb::CardBitmap).arg(x).arg(y).arg(filename),
            BITMAP_BUDGET,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn short_moves_still_get_one_attempt() {
        assert_eq!(motion_budget(0, MM_PER_ATTEMPT), 1);
        assert_eq!(motion_budget(49, MM_PER_ATTEMPT), 1);
        assert_eq!(motion_budget(30, DEGREES_PER_ATTEMPT), 1);
    }

    #[test]
    fn long_moves_scale() {
        assert_eq!(motion_budget(500, MM_PER_ATTEMPT), 10);
        assert_eq!(motion_budget(1000, MM_PER_ATTEMPT), 20);
        assert_eq!(motion_budget(99, MM_PER_ATTEMPT), 1);
        assert_eq!(motion_budget(360, DEGREES_PER_ATTEMPT), 8);
        assert_eq!(motion_budget(90, DEGREES_PER_ATTEMPT), 2);
    }

    #[test]
    fn recordings_get_an_extra_attempt() {
        assert_eq!(recording_budget(0), 1);
        assert_eq!(recording_budget(5), 6);
    }

    #[test]
    fn colours() {
        let command = Command::new(Verb::LCDOptions)
            .arg(LcdColour::Black)
            .arg(LcdColour::White)
            .arg(true);

        assert_eq!(command.to_string(), "LCDOptions 1 0 1");
    }
}
