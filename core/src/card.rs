use std::marker::PhantomData;

use crate::command::{CommandFrame, Instruction};
use crate::directory::{self, ApplicationId};
use crate::error::{Error, Result};
use crate::nfc::Transport;
use crate::response::Outcome;
use crate::settings::{self, AnyFileSettings, ValueFileSettings};
use crate::version::{self, VersionInfo};

/// Hard limit of frames in a single chained response.
pub const MAX_FRAMES: usize = 16;

/// An adapter to communicate with the card through the delegate
pub struct Card<T, Ctx>
where
    T: Transport<Ctx>,
    Ctx: Copy,
{
    delegate: Box<T>,
    max_frames: usize,
    _ctx: PhantomData<Ctx>,
}

impl<T, Ctx> Card<T, Ctx>
where
    T: Transport<Ctx>,
    Ctx: Copy,
{
    /// Initiates an adapter with the delegate.
    pub fn new(delegate: Box<T>) -> Self {
        Self {
            delegate,
            max_frames: MAX_FRAMES,
            _ctx: PhantomData,
        }
    }

    /// Lowers the number of frames accepted in a chained response.
    /// The value is clamped to `1..=MAX_FRAMES`.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames.clamp(1, MAX_FRAMES);
        self
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Selects an application with their identifier.
    pub fn select_application(&self, ctx: Ctx, aid: ApplicationId) -> Result<()> {
        self.transceive(
            ctx,
            Instruction::SelectApplication,
            Some(aid.to_bytes().into()),
        )
        .map(|_| ())
    }

    /// Reads the settings of the file in the selected application.
    pub fn file_settings(&self, ctx: Ctx, file_no: u8) -> Result<AnyFileSettings> {
        let payload = self.transceive(ctx, Instruction::GetFileSettings, Some(vec![file_no]))?;

        Ok(settings::decode_any(&payload)?)
    }

    /// Reads the settings of the value file in the selected application.
    pub fn value_file_settings(&self, ctx: Ctx, file_no: u8) -> Result<ValueFileSettings> {
        let payload = self.transceive(ctx, Instruction::GetFileSettings, Some(vec![file_no]))?;

        Ok(settings::decode_value_file(&payload)?)
    }

    /// Reads the current value of the value file.
    pub fn read_value(&self, ctx: Ctx, file_no: u8) -> Result<i32> {
        let payload = self.transceive(ctx, Instruction::ReadValue, Some(vec![file_no]))?;

        Ok(crate::value::decode(&payload)?)
    }

    /// Reads the manufacturing data of the card.
    pub fn version(&self, ctx: Ctx) -> Result<VersionInfo> {
        let payload = self.transceive(ctx, Instruction::GetManufacturingData, None)?;

        Ok(version::decode(&payload)?)
    }

    /// Lists the applications on the card.
    pub fn application_ids(&self, ctx: Ctx) -> Result<Vec<ApplicationId>> {
        let payload = self.transceive(ctx, Instruction::GetApplicationDirectory, None)?;

        Ok(directory::decode_application_ids(&payload)?)
    }

    /// Lists the files in the selected application.
    pub fn file_ids(&self, ctx: Ctx) -> Result<Vec<u8>> {
        self.transceive(ctx, Instruction::GetFiles, None)
            .map(|payload| directory::decode_file_ids(&payload))
    }

    /// Tells the delegate that the exchange is over.
    pub fn invalidate(&self, ctx: Ctx, reason: Option<&str>) {
        if let Some(reason) = reason {
            warn!("Invalidating the session: {}", reason);
        } else {
            debug!("Invalidating the session");
        }

        self.delegate.invalidate(ctx, reason)
    }

    /// Transmits the command, then follows additional frames until the card completes.
    /// Returns the payloads of all frames concatenated.
    pub fn transceive(
        &self,
        ctx: Ctx,
        instruction: Instruction,
        parameters: Option<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        let mut buf: Vec<u8> = Vec::new();
        let mut outcome = self.handle(ctx, CommandFrame::build(instruction, parameters)?)?;
        let mut frames = 1;

        loop {
            match outcome {
                Outcome::Complete(mut payload) => {
                    buf.append(&mut payload);

                    return Ok(buf);
                }
                Outcome::Continuation(mut payload) => {
                    if frames >= self.max_frames {
                        warn!(
                            "{} requested more than {} frames",
                            instruction.name(),
                            self.max_frames
                        );

                        return Err(Error::TooManyFrames {
                            limit: self.max_frames,
                        });
                    }

                    buf.append(&mut payload);
                    frames += 1;

                    debug!("{}: fetching frame #{}", instruction.name(), frames);
                    outcome =
                        self.handle(ctx, CommandFrame::new(Instruction::GetAdditionalFrame))?;
                }
                Outcome::Failure(status) => {
                    return Err(Error::Protocol {
                        instruction,
                        status,
                    })
                }
            }
        }
    }

    fn handle(&self, ctx: Ctx, command: CommandFrame) -> Result<Outcome> {
        let tx = command.into_bytes();
        debug!("TX: {}", hex::encode(&tx));

        let rx = self.delegate.send(ctx, &tx)?;
        debug!("RX: {}", hex::encode(&rx));

        Ok(Outcome::classify(rx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::nfc::TransportError;
    use crate::response::status;
    use crate::DecodeError;

    fn with_status(payload: &[u8], status: u8) -> Vec<u8> {
        let mut raw = payload.to_vec();
        raw.push(status);
        raw
    }

    fn card(mock: &MockTransport) -> Card<MockTransport, ()> {
        Card::new(Box::new(mock.clone()))
    }

    #[test]
    fn test_select_application() {
        let mock = MockTransport::new(vec![Ok(vec![0x00])]);

        card(&mock)
            .select_application((), ApplicationId::new(0x5F8415))
            .unwrap();
        assert_eq!(
            vec![vec![0x90, 0x5A, 0x00, 0x00, 0x03, 0x5F, 0x84, 0x15, 0x00]],
            mock.sent()
        );
    }

    #[test]
    fn test_protocol_error() {
        let mock = MockTransport::new(vec![Ok(vec![status::PERMISSION_DENIED])]);

        assert!(matches!(
            card(&mock).read_value((), 1),
            Err(Error::Protocol {
                instruction: Instruction::ReadValue,
                status: 0x9D,
            })
        ));
    }

    #[test]
    fn test_empty_response() {
        let mock = MockTransport::new(vec![Ok(vec![])]);

        assert!(matches!(
            card(&mock).read_value((), 1),
            Err(Error::Decode(DecodeError::EmptyResponse))
        ));
    }

    #[test]
    fn test_continuation_frames() {
        let frames = crate::version::tests::FRAMES;
        let mock = MockTransport::new(vec![
            Ok(with_status(frames[0], status::ADDITIONAL_FRAME)),
            Ok(with_status(frames[1], status::ADDITIONAL_FRAME)),
            Ok(with_status(frames[2], status::OPERATION_OK)),
        ]);

        let info = card(&mock).version(()).unwrap();

        assert_eq!(0x0A, info.production_year);
        assert_eq!(
            vec![
                vec![0x90, 0x60, 0x00, 0x00, 0x00],
                vec![0x90, 0xAF, 0x00, 0x00, 0x00],
                vec![0x90, 0xAF, 0x00, 0x00, 0x00],
            ],
            mock.sent()
        );
    }

    #[test]
    fn test_endless_continuation() {
        let mock = MockTransport::endless(vec![0xAB, 0xAF]);

        assert!(matches!(
            card(&mock).application_ids(()),
            Err(Error::TooManyFrames { limit: MAX_FRAMES })
        ));
        assert_eq!(MAX_FRAMES, mock.sent().len());
    }

    #[test]
    fn test_max_frames_is_clamped() {
        let mock = MockTransport::endless(vec![0xAF]);

        assert_eq!(MAX_FRAMES, card(&mock).with_max_frames(1000).max_frames());
        assert_eq!(1, card(&mock).with_max_frames(0).max_frames());

        assert!(matches!(
            card(&mock).with_max_frames(2).file_ids(()),
            Err(Error::TooManyFrames { limit: 2 })
        ));
        assert_eq!(2, mock.sent().len());
    }

    #[test]
    fn test_continuation_then_failure() {
        let mock = MockTransport::new(vec![
            Ok(vec![0x5F, 0x84, 0x15, 0xAF]),
            Ok(vec![0xAE]),
        ]);

        assert!(matches!(
            card(&mock).application_ids(()),
            Err(Error::Protocol {
                instruction: Instruction::GetApplicationDirectory,
                status: 0xAE,
            })
        ));
    }

    #[test]
    fn test_chained_directory() {
        let mock = MockTransport::new(vec![
            Ok(vec![0x5F, 0x84, 0x15, 0xAF]),
            Ok(vec![0x00, 0x00, 0x01, 0x00]),
        ]);

        assert_eq!(
            vec![ApplicationId::new(0x5F8415), ApplicationId::new(0x01)],
            card(&mock).application_ids(()).unwrap()
        );
    }

    #[test]
    fn test_transport_errors() {
        let mock = MockTransport::new(vec![Err(TransportError::link("tag was lost"))]);
        assert!(matches!(
            card(&mock).file_ids(()),
            Err(Error::Transport(TransportError::Link(_)))
        ));

        let mock = MockTransport::new(vec![Err(TransportError::Cancelled)]);
        assert!(matches!(card(&mock).file_ids(()), Err(Error::Cancelled)));
    }

    #[test]
    fn test_oversized_parameters_are_not_sent() {
        let mock = MockTransport::new(vec![]);

        assert!(matches!(
            card(&mock).transceive((), Instruction::GetFileSettings, Some(vec![0u8; 300])),
            Err(Error::InvalidParameters { len: 300 })
        ));
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn test_file_settings() {
        let mock = MockTransport::new(vec![Ok(vec![
            0x00, 0x00, 0xEE, 0xEE, 0x20, 0x00, 0x00, 0x00,
        ])]);

        match card(&mock).file_settings((), 2).unwrap() {
            AnyFileSettings::StandardData(s) => assert_eq!(32, s.file_size),
            other => panic!("expected a standard data file, got {:?}", other),
        }
        assert_eq!(
            vec![vec![0x90, 0xF5, 0x00, 0x00, 0x01, 0x02, 0x00]],
            mock.sent()
        );
    }

    #[test]
    fn test_settings_split_across_frames() {
        let mock = MockTransport::new(vec![
            Ok(vec![0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xAF]),
            Ok(vec![
                0x40, 0x42, 0x0F, 0x00, 0x04, 0xA6, 0x00, 0x00, 0x01, 0x00,
            ]),
        ]);

        let settings = card(&mock).value_file_settings((), 1).unwrap();

        assert_eq!(1_000_000, settings.upper_limit);
        assert_eq!(42500, settings.value);
        assert!(settings.is_limited_credit_enabled());
        assert_eq!(
            vec![
                vec![0x90, 0xF5, 0x00, 0x00, 0x01, 0x01, 0x00],
                vec![0x90, 0xAF, 0x00, 0x00, 0x00],
            ],
            mock.sent()
        );
    }
}
