//! The controller: every dispatcher entry point in one place.
//!
//! The host owns a single `Controller` and calls into it from its event
//! dispatcher: button actions, sensor batches, redraw requests, delivery
//! callbacks, timer expiries. The dispatcher is single-threaded and every
//! handler here runs to completion, so no partial state is ever observable
//! between events. The only asynchronous-shaped flow is export pacing:
//! [`Controller::request_export`] returns once the first chunk is handed to
//! the channel, and the session advances through
//! [`Controller::chunk_delivered`] / [`Controller::pacing_elapsed`]
//! re-entering the controller later.

use wristsketch_protocol::transfer::{ChunkMessage, TransferAck, TransferSession};

use crate::motion::{AccelSample, CursorMapper};
use crate::raster::{Bitmap, DrawMode, Point, SketchCanvas};
use crate::settings::Settings;
use crate::store;
use crate::traits::{ChannelError, KeyValueStore, Platform};

/// Delay between chunk sends, letting the receiver and its UI keep up.
///
/// Pacing only; correctness does not depend on the value.
pub const CHUNK_PACING_MS: u32 = 15;

/// Why an export request was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExportError {
    /// Nothing drawn, nothing to send
    NoImage,
    /// A session is already in flight; it is never superseded
    Busy,
    /// The channel refused the first chunk
    Channel(ChannelError),
}

/// Why a running export session ended early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExportFailure {
    /// The channel reported a delivery failure
    Channel(ChannelError),
    /// The image was discarded while the session was in flight
    ImageDiscarded,
}

/// Observable state of the export machinery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExportStatus {
    /// No session started since launch
    Idle,
    /// Session in flight
    Sending {
        /// Bytes positioned so far, as a percentage of the total
        percent: u8,
    },
    /// Last session delivered every chunk
    Complete,
    /// Last session aborted
    Failed(ExportFailure),
}

/// Central coordinator for canvas, tilt mapping, settings and export.
///
/// Generic over the host [`Platform`]; durable storage is passed into the
/// lifecycle handlers instead of being owned, since it is only touched at
/// boundaries.
pub struct Controller<P: Platform> {
    platform: P,
    canvas: SketchCanvas,
    mapper: CursorMapper,
    settings: Settings,
    session: Option<TransferSession>,
    last_failure: Option<ExportFailure>,
}

impl<P: Platform> Controller<P> {
    /// Create a controller with default settings
    pub fn new(platform: P) -> Self {
        let settings = Settings::default();
        let mut canvas = SketchCanvas::new();
        canvas.apply_settings(&settings);
        Self {
            platform,
            canvas,
            mapper: CursorMapper::new(settings.sensitivity),
            settings,
            session: None,
            last_failure: None,
        }
    }

    /// Load persisted settings and image (launch)
    pub fn startup<S: KeyValueStore>(&mut self, store: &mut S) {
        let settings = store::load_settings(store).unwrap_or_default();
        self.adopt_settings(settings);
        self.canvas.restore_image(store::load_image(store));
    }

    /// Pause and persist (window close).
    ///
    /// The image is written only if it changed since load; a failed save
    /// leaves the dirty flag set and degrades to "not persisted".
    pub fn shutdown<S: KeyValueStore>(&mut self, store: &mut S) {
        self.pause();
        if self.canvas.is_dirty() {
            match store::save_image(store, self.canvas.image()) {
                Ok(()) => self.canvas.clear_dirty(),
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("image save failed: {}", _e);
                }
            }
        }
    }

    /// Render the canvas and cursor overlay onto the display surface
    pub fn redraw(&self, surface: &mut Bitmap) {
        self.canvas.render(surface);
    }

    /// Stop drawing immediately (focus loss, overlay shown, window close).
    ///
    /// Does not cancel an in-flight export session; that only ends through
    /// its own delivery callbacks.
    pub fn pause(&mut self) {
        self.canvas.set_idle();
        self.update_backlight();
    }

    /// Drop the tilt reference; the next clean sensor batch re-centers
    pub fn recenter(&mut self) {
        self.mapper.reset();
    }

    /// Toggle pen mode
    pub fn toggle_pen(&mut self) -> DrawMode {
        let mode = self.canvas.toggle_pen();
        self.update_backlight();
        mode
    }

    /// Toggle eraser mode
    pub fn toggle_eraser(&mut self) -> DrawMode {
        let mode = self.canvas.toggle_eraser();
        self.update_backlight();
        mode
    }

    /// Undo the last committed change; answers with a short pulse
    pub fn undo(&mut self) {
        if self.canvas.undo() {
            self.platform.short_pulse();
        }
    }

    /// Discard the drawing; answers with a double pulse
    pub fn clear(&mut self) {
        if self.canvas.clear() {
            self.platform.double_pulse();
        }
    }

    /// Move the cursor directly (directional buttons)
    pub fn move_cursor(&mut self, location: Point) {
        self.canvas.set_cursor(location);
    }

    /// Process one accelerometer batch
    pub fn handle_accel(&mut self, samples: &[AccelSample]) {
        if let Some(location) = self.mapper.handle_batch(samples) {
            self.canvas.set_cursor(location);
        }
    }

    /// Apply new settings and persist them
    pub fn apply_settings<S: KeyValueStore>(&mut self, settings: Settings, store: &mut S) {
        self.adopt_settings(settings);
        if let Err(_e) = store::save_settings(store, &self.settings) {
            #[cfg(feature = "defmt")]
            defmt::warn!("settings save failed: {}", _e);
        }
    }

    /// Start a one-shot export of the drawing.
    ///
    /// Rejected when there is nothing to send or while a session is
    /// already in flight. On success the first chunk is on the wire and
    /// the rest follow from the delivery callbacks.
    pub fn request_export(&mut self) -> Result<(), ExportError> {
        if self.session.map_or(false, |s| s.is_active()) {
            return Err(ExportError::Busy);
        }
        let total = match self.canvas.image_bytes() {
            Some(bytes) => bytes.len(),
            None => return Err(ExportError::NoImage),
        };
        let session = TransferSession::begin(total).map_err(|_| ExportError::NoImage)?;
        self.session = Some(session);
        self.last_failure = None;
        self.send_current()
    }

    /// Delivery confirmation from the channel.
    ///
    /// Advances the session; a non-final chunk arms the pacing timer, the
    /// final one completes the session.
    pub fn chunk_delivered(&mut self) {
        let session = match self.session.as_mut() {
            Some(session) if session.is_active() => session,
            _ => return,
        };
        match session.acknowledge() {
            TransferAck::Next(_) => self.platform.schedule_resume(CHUNK_PACING_MS),
            TransferAck::Complete => {
                #[cfg(feature = "defmt")]
                defmt::debug!("export complete");
            }
        }
    }

    /// Delivery failure from the channel: abort, no retry
    pub fn chunk_failed(&mut self, reason: ChannelError) {
        if self.session.map_or(false, |s| s.is_active()) {
            self.fail_export(ExportFailure::Channel(reason));
        }
    }

    /// Pacing timer expiry: put the next chunk on the wire
    pub fn pacing_elapsed(&mut self) {
        let _ = self.send_current();
    }

    /// Observable export state, including progress while sending
    pub fn export_status(&self) -> ExportStatus {
        if let Some(session) = &self.session {
            if session.is_active() {
                return ExportStatus::Sending {
                    percent: session.progress_percent(),
                };
            }
        }
        if let Some(failure) = self.last_failure {
            return ExportStatus::Failed(failure);
        }
        if self.session.is_some() {
            return ExportStatus::Complete;
        }
        ExportStatus::Idle
    }

    /// Current cursor location
    pub fn cursor(&self) -> Point {
        self.canvas.cursor()
    }

    /// Current drawing mode
    pub fn mode(&self) -> DrawMode {
        self.canvas.mode()
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read-only image bytes, or `None` when there is no drawing
    pub fn image_bytes(&self) -> Option<&[u8]> {
        self.canvas.image_bytes()
    }

    fn adopt_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.canvas.apply_settings(&settings);
        self.mapper.set_sensitivity(settings.sensitivity);
        self.update_backlight();
    }

    /// Hold the light on exactly while a drawing mode is active and the
    /// option is set
    fn update_backlight(&mut self) {
        let on = self.settings.backlight_always_on && self.canvas.mode().is_drawing();
        self.platform.set_on(on);
    }

    /// Send the chunk at the session's current position
    fn send_current(&mut self) -> Result<(), ExportError> {
        let chunk = match self.session.as_ref().and_then(TransferSession::current) {
            Some(chunk) => chunk,
            None => return Ok(()),
        };

        // Slice the live image; it can have been discarded mid-session
        let message = match self.canvas.image_bytes() {
            Some(bytes) => ChunkMessage::new(chunk.status, &bytes[chunk.range()]).ok(),
            None => None,
        };
        let message = match message {
            Some(message) => message,
            None => {
                self.fail_export(ExportFailure::ImageDiscarded);
                return Err(ExportError::NoImage);
            }
        };

        if let Err(reason) = self.platform.send(&message) {
            self.fail_export(ExportFailure::Channel(reason));
            return Err(ExportError::Channel(reason));
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("sent chunk - pos: {}, len: {}", chunk.offset, chunk.len);
        Ok(())
    }

    fn fail_export(&mut self, failure: ExportFailure) {
        if let Some(session) = self.session.as_mut() {
            session.abort();
        }
        self.last_failure = Some(failure);
        #[cfg(feature = "defmt")]
        defmt::warn!("export aborted: {}", failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::Sensitivity;
    use crate::raster::BITMAP_BYTES;
    use crate::traits::{Backlight, Haptics, OutboundChannel, StoreError};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;
    use wristsketch_protocol::transfer::ChunkStatus;

    /// Everything the mock platform was asked to do, in order where it
    /// matters
    #[derive(Default)]
    struct Recorded {
        short_pulses: usize,
        double_pulses: usize,
        backlight: Vec<bool>,
        sent: Vec<ChunkMessage>,
        scheduled: Vec<u32>,
        fail_sends: bool,
    }

    #[derive(Clone, Default)]
    struct MockPlatform(Rc<RefCell<Recorded>>);

    impl Haptics for MockPlatform {
        fn short_pulse(&mut self) {
            self.0.borrow_mut().short_pulses += 1;
        }
        fn double_pulse(&mut self) {
            self.0.borrow_mut().double_pulses += 1;
        }
    }

    impl Backlight for MockPlatform {
        fn set_on(&mut self, on: bool) {
            self.0.borrow_mut().backlight.push(on);
        }
    }

    impl OutboundChannel for MockPlatform {
        fn send(&mut self, message: &ChunkMessage) -> Result<(), ChannelError> {
            let mut recorded = self.0.borrow_mut();
            if recorded.fail_sends {
                return Err(ChannelError::Busy);
            }
            recorded.sent.push(message.clone());
            Ok(())
        }
        fn schedule_resume(&mut self, delay_ms: u32) {
            self.0.borrow_mut().scheduled.push(delay_ms);
        }
    }

    #[derive(Default)]
    struct MockStore {
        entries: BTreeMap<u32, Vec<u8>>,
    }

    impl KeyValueStore for MockStore {
        fn exists(&self, key: u32) -> bool {
            self.entries.contains_key(&key)
        }
        fn read(&self, key: u32, buffer: &mut [u8]) -> Result<usize, StoreError> {
            let data = self.entries.get(&key).ok_or(StoreError::NotFound)?;
            let len = data.len().min(buffer.len());
            buffer[..len].copy_from_slice(&data[..len]);
            Ok(len)
        }
        fn write(&mut self, key: u32, data: &[u8]) -> Result<(), StoreError> {
            self.entries.insert(key, data.to_vec());
            Ok(())
        }
        fn delete(&mut self, key: u32) -> Result<(), StoreError> {
            self.entries.remove(&key).ok_or(StoreError::NotFound)?;
            Ok(())
        }
    }

    fn controller() -> (Controller<MockPlatform>, Rc<RefCell<Recorded>>) {
        let platform = MockPlatform::default();
        let recorded = platform.0.clone();
        (Controller::new(platform), recorded)
    }

    /// Put some ink on the canvas and return to idle
    fn draw_something(controller: &mut Controller<MockPlatform>) {
        controller.toggle_pen();
        controller.move_cursor(Point::new(100, 90));
        controller.move_cursor(Point::new(100, 120));
        controller.toggle_pen();
    }

    /// Run the export session to its terminal state, as the dispatcher
    /// would: confirm delivery, let the pacing timer fire, repeat.
    fn drive_export(controller: &mut Controller<MockPlatform>, recorded: &Rc<RefCell<Recorded>>) {
        loop {
            controller.chunk_delivered();
            let pending = recorded.borrow_mut().scheduled.pop();
            match pending {
                Some(_) => controller.pacing_elapsed(),
                None => break,
            }
        }
    }

    #[test]
    fn test_undo_answers_with_short_pulse() {
        let (mut controller, recorded) = controller();
        controller.undo();
        assert_eq!(recorded.borrow().short_pulses, 0);

        draw_something(&mut controller);
        draw_something(&mut controller);
        controller.undo();
        assert_eq!(recorded.borrow().short_pulses, 1);
        assert_eq!(recorded.borrow().double_pulses, 0);
    }

    #[test]
    fn test_clear_answers_with_double_pulse() {
        let (mut controller, recorded) = controller();
        controller.clear();
        assert_eq!(recorded.borrow().double_pulses, 0);

        draw_something(&mut controller);
        controller.clear();
        controller.clear();
        assert_eq!(recorded.borrow().double_pulses, 1);
        assert!(controller.image_bytes().is_none());
    }

    #[test]
    fn test_backlight_follows_drawing_mode() {
        let (mut controller, recorded) = controller();
        let mut store = MockStore::default();
        let settings = Settings {
            backlight_always_on: true,
            ..Settings::default()
        };
        controller.apply_settings(settings, &mut store);

        controller.toggle_pen();
        assert_eq!(recorded.borrow().backlight.last(), Some(&true));
        controller.toggle_pen();
        assert_eq!(recorded.borrow().backlight.last(), Some(&false));

        controller.toggle_eraser();
        assert_eq!(recorded.borrow().backlight.last(), Some(&true));
        controller.pause();
        assert_eq!(recorded.borrow().backlight.last(), Some(&false));
    }

    #[test]
    fn test_accel_batches_move_cursor() {
        let (mut controller, _) = controller();
        // First clean batch centers, second one maps
        controller.handle_accel(&[AccelSample::new(0, 0, -1000)]);
        assert_eq!(controller.cursor(), Point::new(72, 84));
        controller.handle_accel(&[AccelSample::new(100, 0, -1000)]);
        assert_eq!(controller.cursor(), Point::new(73, 84));

        // Recenter: the tilted attitude becomes the new rest
        controller.recenter();
        controller.handle_accel(&[AccelSample::new(100, 0, -1000)]);
        controller.handle_accel(&[AccelSample::new(100, 0, -1000)]);
        assert_eq!(controller.cursor(), Point::new(72, 84));
    }

    #[test]
    fn test_export_without_image_is_rejected() {
        let (mut controller, recorded) = controller();
        assert_eq!(controller.request_export(), Err(ExportError::NoImage));
        assert!(recorded.borrow().sent.is_empty());
        assert_eq!(controller.export_status(), ExportStatus::Idle);
    }

    #[test]
    fn test_export_delivers_whole_image() {
        let (mut controller, recorded) = controller();
        draw_something(&mut controller);

        controller.request_export().unwrap();
        assert!(matches!(
            controller.export_status(),
            ExportStatus::Sending { percent: 0 }
        ));
        drive_export(&mut controller, &recorded);

        let recorded = recorded.borrow();
        assert_eq!(recorded.sent.len(), 7);
        assert_eq!(recorded.sent[0].status, ChunkStatus::First);
        for message in &recorded.sent[1..6] {
            assert_eq!(message.status, ChunkStatus::Mid);
        }
        assert_eq!(recorded.sent[6].status, ChunkStatus::Last);
        assert_eq!(recorded.sent[6].payload.len(), 288);

        let total: usize = recorded.sent.iter().map(|m| m.payload.len()).sum();
        assert_eq!(total, BITMAP_BYTES);
        assert_eq!(controller.export_status(), ExportStatus::Complete);

        // The wire bytes are the image bytes, in order
        let mut reassembled = Vec::new();
        for message in &recorded.sent {
            reassembled.extend_from_slice(&message.payload);
        }
        assert_eq!(reassembled.as_slice(), controller.image_bytes().unwrap());
    }

    #[test]
    fn test_export_is_not_reentrant() {
        let (mut controller, _recorded) = controller();
        draw_something(&mut controller);
        controller.request_export().unwrap();
        assert_eq!(controller.request_export(), Err(ExportError::Busy));
    }

    #[test]
    fn test_export_can_rerun_after_completion() {
        let (mut controller, recorded) = controller();
        draw_something(&mut controller);
        controller.request_export().unwrap();
        drive_export(&mut controller, &recorded);
        recorded.borrow_mut().sent.clear();

        controller.request_export().unwrap();
        drive_export(&mut controller, &recorded);
        assert_eq!(recorded.borrow().sent.len(), 7);
        assert_eq!(controller.export_status(), ExportStatus::Complete);
    }

    #[test]
    fn test_delivery_failure_aborts_without_retry() {
        let (mut controller, recorded) = controller();
        draw_something(&mut controller);
        controller.request_export().unwrap();

        controller.chunk_failed(ChannelError::Disconnected);
        assert_eq!(
            controller.export_status(),
            ExportStatus::Failed(ExportFailure::Channel(ChannelError::Disconnected))
        );
        // Late callbacks after the abort change nothing
        controller.chunk_delivered();
        controller.pacing_elapsed();
        assert_eq!(recorded.borrow().sent.len(), 1);

        // A fresh request starts over
        controller.request_export().unwrap();
        assert!(matches!(
            controller.export_status(),
            ExportStatus::Sending { .. }
        ));
    }

    #[test]
    fn test_channel_refusal_surfaces_reason() {
        let (mut controller, recorded) = controller();
        draw_something(&mut controller);
        recorded.borrow_mut().fail_sends = true;

        assert_eq!(
            controller.request_export(),
            Err(ExportError::Channel(ChannelError::Busy))
        );
        assert_eq!(
            controller.export_status(),
            ExportStatus::Failed(ExportFailure::Channel(ChannelError::Busy))
        );
    }

    #[test]
    fn test_clear_during_export_fails_session() {
        let (mut controller, recorded) = controller();
        draw_something(&mut controller);
        controller.request_export().unwrap();
        controller.chunk_delivered();

        controller.clear();
        controller.pacing_elapsed();
        assert_eq!(
            controller.export_status(),
            ExportStatus::Failed(ExportFailure::ImageDiscarded)
        );
        assert_eq!(recorded.borrow().sent.len(), 1);
    }

    #[test]
    fn test_pause_does_not_cancel_export() {
        let (mut controller, recorded) = controller();
        draw_something(&mut controller);
        controller.request_export().unwrap();

        controller.pause();
        drive_export(&mut controller, &recorded);
        assert_eq!(controller.export_status(), ExportStatus::Complete);
    }

    #[test]
    fn test_lifecycle_round_trip() {
        let platform = MockPlatform::default();
        let mut store = MockStore::default();

        let mut first = Controller::new(platform.clone());
        let settings = Settings {
            pen_width: 5,
            sensitivity: Sensitivity::High,
            ..Settings::default()
        };
        first.apply_settings(settings, &mut store);
        draw_something(&mut first);
        let drawn: Vec<u8> = first.image_bytes().unwrap().to_vec();
        first.shutdown(&mut store);

        let mut second = Controller::new(MockPlatform::default());
        second.startup(&mut store);
        assert_eq!(second.image_bytes().unwrap(), drawn.as_slice());
        assert_eq!(second.settings().pen_width, 5);
        assert_eq!(second.settings().sensitivity, Sensitivity::High);
        assert_eq!(second.mode(), DrawMode::Idle);
    }

    #[test]
    fn test_shutdown_skips_save_when_unchanged() {
        let mut store = MockStore::default();
        let (mut controller, _) = controller();
        controller.shutdown(&mut store);
        assert!(store.entries.is_empty());
    }

    #[test]
    fn test_shutdown_persists_cleared_canvas_as_absent() {
        let mut store = MockStore::default();
        let (mut controller, _) = controller();
        draw_something(&mut controller);
        controller.shutdown(&mut store);
        assert!(!store.entries.is_empty());

        controller.clear();
        controller.shutdown(&mut store);
        assert!(store.entries.is_empty());

        let mut relaunched = Controller::new(MockPlatform::default());
        relaunched.startup(&mut store);
        assert!(relaunched.image_bytes().is_none());
    }
}
