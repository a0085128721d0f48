//! Bit-banged driver for a single chain of one-wire addressable LEDs.
//!
//! Every bit is a high pulse followed by a low gap; the width of the high
//! pulse tells the receiver whether the bit is a 0 or a 1. The tolerance on
//! those widths is a few hundred nanoseconds, so a frame is always clocked
//! out inside a critical section. Delays are supplied by an injected
//! [`DelayNs`] so the same encoder runs against cycle-counted target delays
//! and host-side recorders.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::lines::Level;

/// Number of LEDs on the front-panel chain.
pub const LED_COUNT: usize = 3;
/// Bytes clocked out per LED.
pub const LED_BYTES: usize = 3;
/// Bytes in one full frame.
pub const FRAME_BYTES: usize = LED_COUNT * LED_BYTES;

/// 24-bit color stored as `0xRRGGBB` and sent most-significant byte first.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct LedColor(u32);

impl LedColor {
    pub const OFF: Self = Self(0);

    /// Builds a color from a packed `0xRRGGBB` value; the top byte is ignored.
    pub const fn from_u32(packed: u32) -> Self {
        Self(packed & 0x00FF_FFFF)
    }

    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(((red as u32) << 16) | ((green as u32) << 8) | blue as u32)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Wire order of the three channel bytes.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn bytes(self) -> [u8; LED_BYTES] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    pub const fn from_bytes(bytes: [u8; LED_BYTES]) -> Self {
        Self::from_rgb(bytes[0], bytes[1], bytes[2])
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

/// Physical position of each LED on the chain, fixed by board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LedSlot {
    Power,
    DiscLeft,
    DiscRight,
}

impl LedSlot {
    pub const ALL: [LedSlot; LED_COUNT] = [LedSlot::Power, LedSlot::DiscLeft, LedSlot::DiscRight];

    pub const fn as_index(self) -> usize {
        match self {
            LedSlot::Power => 0,
            LedSlot::DiscLeft => 1,
            LedSlot::DiscRight => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            LedSlot::Power => "power",
            LedSlot::DiscLeft => "disc-left",
            LedSlot::DiscRight => "disc-right",
        }
    }
}

/// Pulse widths for the one-wire protocol, in nanoseconds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LedTiming {
    pub t0h_ns: u32,
    pub t0l_ns: u32,
    pub t1h_ns: u32,
    pub t1l_ns: u32,
    pub latch_ns: u32,
}

impl LedTiming {
    /// Everlight 19-C47 / 12-23C one-wire RGB timing.
    pub const EVERLIGHT_19C47: Self = Self {
        t0h_ns: 300,
        t0l_ns: 900,
        t1h_ns: 900,
        t1l_ns: 300,
        latch_ns: 50_000,
    };

    pub const fn high_ns(&self, bit: bool) -> u32 {
        if bit { self.t1h_ns } else { self.t0h_ns }
    }

    pub const fn low_ns(&self, bit: bool) -> u32 {
        if bit { self.t1l_ns } else { self.t0l_ns }
    }

    /// High-time boundary that separates a 0 from a 1 on the receiving side.
    pub const fn classification_threshold_ns(&self) -> u32 {
        let (short, long) = if self.t0h_ns <= self.t1h_ns {
            (self.t0h_ns, self.t1h_ns)
        } else {
            (self.t1h_ns, self.t0h_ns)
        };
        short + (long - short) / 2
    }
}

impl Default for LedTiming {
    fn default() -> Self {
        Self::EVERLIGHT_19C47
    }
}

/// Failures surfaced by the LED encoder.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LedError<E> {
    /// The data line rejected a level change.
    Pin(E),
    /// The index does not address an LED on the chain.
    IndexOutOfRange { index: usize, len: usize },
}

impl<E: fmt::Debug> fmt::Display for LedError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedError::Pin(err) => write!(f, "LED data line error: {err:?}"),
            LedError::IndexOutOfRange { index, len } => {
                write!(f, "LED index {index} out of range for chain of {len}")
            }
        }
    }
}

/// Colors for each LED in chain order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LedBuffer<const N: usize = LED_COUNT> {
    colors: [LedColor; N],
}

impl<const N: usize> LedBuffer<N> {
    pub const fn new() -> Self {
        Self {
            colors: [LedColor::OFF; N],
        }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn get(&self, index: usize) -> Option<LedColor> {
        self.colors.get(index).copied()
    }

    pub fn as_slice(&self) -> &[LedColor] {
        &self.colors
    }

    pub fn try_set(&mut self, index: usize, color: LedColor) -> Result<(), usize> {
        match self.colors.get_mut(index) {
            Some(slot) => {
                *slot = color;
                Ok(())
            }
            None => Err(N),
        }
    }

    /// Iterates over the frame bytes in transmission order.
    pub fn frame_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.colors.iter().flat_map(|color| color.bytes())
    }
}

impl<const N: usize> Default for LedBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes an [`LedBuffer`] onto the data line.
pub struct LedStripEncoder<P, D, const N: usize = LED_COUNT> {
    pin: P,
    delay: D,
    timing: LedTiming,
    buffer: LedBuffer<N>,
}

impl<P, D, const N: usize> LedStripEncoder<P, D, N>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Takes ownership of the data line and parks it low.
    pub fn new(mut pin: P, delay: D, timing: LedTiming) -> Result<Self, LedError<P::Error>> {
        pin.set_low().map_err(LedError::Pin)?;
        Ok(Self {
            pin,
            delay,
            timing,
            buffer: LedBuffer::new(),
        })
    }

    pub fn buffer(&self) -> &LedBuffer<N> {
        &self.buffer
    }

    pub fn timing(&self) -> LedTiming {
        self.timing
    }

    /// Writes `color` into the buffer without transmitting it.
    ///
    /// # Panics
    ///
    /// Panics when `index` does not address an LED on the chain.
    pub fn set_color(&mut self, index: usize, color: LedColor) {
        if let Err(err) = self.try_set_color(index, color) {
            panic!("{err}");
        }
    }

    /// Writes `color` into the buffer, rejecting out-of-range indices.
    pub fn try_set_color(
        &mut self,
        index: usize,
        color: LedColor,
    ) -> Result<(), LedError<P::Error>> {
        self.buffer
            .try_set(index, color)
            .map_err(|len| LedError::IndexOutOfRange { index, len })
    }

    /// Clocks the whole buffer out and waits for the latch period.
    ///
    /// Interrupts stay masked for the entire frame; the latch wait runs with
    /// them enabled again.
    pub fn refresh(&mut self) -> Result<(), LedError<P::Error>> {
        critical_section::with(|_| self.write_frame())?;
        self.delay.delay_ns(self.timing.latch_ns);
        Ok(())
    }

    fn write_frame(&mut self) -> Result<(), LedError<P::Error>> {
        let Self {
            pin,
            delay,
            timing,
            buffer,
        } = self;

        for byte in buffer.frame_bytes() {
            for shift in (0..8).rev() {
                let bit = (byte >> shift) & 1 == 1;
                pin.set_high().map_err(LedError::Pin)?;
                delay.delay_ns(timing.high_ns(bit));
                pin.set_low().map_err(LedError::Pin)?;
                delay.delay_ns(timing.low_ns(bit));
            }
        }
        Ok(())
    }

    /// Returns the data line and delay provider.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P, D> LedStripEncoder<P, D, LED_COUNT>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Writes `color` into the buffer slot wired to `slot`.
    pub fn set_slot(&mut self, slot: LedSlot, color: LedColor) {
        self.set_color(slot.as_index(), color);
    }
}

/// Rebuilds frame bytes from observed line levels and delays.
///
/// Each high pulse is classified against the timing's threshold; a low
/// period of at least the latch duration marks the frame as complete.
#[derive(Clone, Debug)]
pub struct BitstreamDecoder<const BYTES: usize = FRAME_BYTES> {
    timing: LedTiming,
    level: Level,
    high_ns: u32,
    low_ns: u32,
    current: u8,
    bits: u8,
    bytes: Vec<u8, BYTES>,
    overflowed: bool,
}

impl<const BYTES: usize> BitstreamDecoder<BYTES> {
    pub const fn new(timing: LedTiming) -> Self {
        Self {
            timing,
            level: Level::Low,
            high_ns: 0,
            low_ns: 0,
            current: 0,
            bits: 0,
            bytes: Vec::new(),
            overflowed: false,
        }
    }

    /// Records a level change on the data line.
    pub fn record_level(&mut self, level: Level) {
        match (self.level, level) {
            (Level::Low, Level::High) => {
                self.high_ns = 0;
                self.low_ns = 0;
            }
            (Level::High, Level::Low) => {
                let bit = self.high_ns >= self.timing.classification_threshold_ns();
                self.push_bit(bit);
            }
            _ => {}
        }
        self.level = level;
    }

    /// Records time spent at the current level.
    pub fn record_delay(&mut self, ns: u32) {
        match self.level {
            Level::High => self.high_ns = self.high_ns.saturating_add(ns),
            Level::Low => self.low_ns = self.low_ns.saturating_add(ns),
        }
    }

    fn push_bit(&mut self, bit: bool) {
        self.current = (self.current << 1) | u8::from(bit);
        self.bits += 1;
        if self.bits == 8 {
            if self.bytes.push(self.current).is_err() {
                self.overflowed = true;
            }
            self.current = 0;
            self.bits = 0;
        }
    }

    /// Completed bytes, in the order they were received.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Colors assembled from complete three-byte groups.
    pub fn colors(&self) -> impl Iterator<Item = LedColor> + '_ {
        self.bytes
            .chunks_exact(LED_BYTES)
            .map(|chunk| LedColor::from_bytes([chunk[0], chunk[1], chunk[2]]))
    }

    /// Returns `true` once the line has idled low for the latch period after data.
    pub fn is_latched(&self) -> bool {
        self.level.is_low() && !self.bytes.is_empty() && self.low_ns >= self.timing.latch_ns
    }

    /// Returns `true` when bits arrived that do not form a whole byte.
    pub fn has_partial_byte(&self) -> bool {
        self.bits != 0
    }

    /// Returns `true` if more bytes arrived than the decoder can hold.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Clears captured data so the next frame can be decoded.
    pub fn reset(&mut self) {
        self.high_ns = 0;
        self.low_ns = 0;
        self.current = 0;
        self.bits = 0;
        self.bytes.clear();
        self.overflowed = false;
    }
}
