use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::{MediaSource, MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;
use tracing::{debug, info};

use super::error::IntakeError;
use super::source::{PacketSource, PresentationTime, StreamOpener, StreamPacket};

/// Opens streams with symphonia's format probe
///
/// `http://` and `https://` URLs are fetched with ureq; `file://` URLs and
/// bare paths are read from disk.
#[derive(Debug, Clone)]
pub struct SymphoniaOpener {
    /// Fallback format hint when neither URL nor content type carries one
    extension: Option<String>,
}

impl SymphoniaOpener {
    pub fn new() -> Self {
        Self { extension: None }
    }

    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: Some(extension.into()),
        }
    }

    fn open_http(
        &self,
        url: &str,
        timeout: Duration,
        hint: &mut Hint,
    ) -> Result<Box<dyn MediaSource>, IntakeError> {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();

        let response = agent.get(url).call()?;
        debug!(
            "HTTP {} from {} (content type: {})",
            response.status(),
            url,
            response.content_type()
        );
        hint.mime_type(response.content_type());

        let reader: Box<dyn Read + Send + Sync> = response.into_reader();
        Ok(Box::new(ReadOnlySource::new(reader)))
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn MediaSource>, IntakeError> {
        let file = File::open(path)?;
        Ok(Box::new(file))
    }
}

impl Default for SymphoniaOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamOpener for SymphoniaOpener {
    fn open(&self, url: &str, timeout: Duration) -> Result<Box<dyn PacketSource>, IntakeError> {
        let mut hint = Hint::new();
        if let Some(ext) = &self.extension {
            hint.with_extension(ext);
        }

        let source = if url.starts_with("http://") || url.starts_with("https://") {
            self.open_http(url, timeout, &mut hint)?
        } else {
            let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                hint.with_extension(ext);
            }
            self.open_file(path)?
        };

        let stream = MediaSourceStream::new(source, Default::default());
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(map_symphonia_error)?;

        let format = probed.format;
        let track = select_audio_track(format.as_ref()).ok_or(IntakeError::NoAudioTrack)?;
        let track_id = track.id;
        let time_base = track_time_base(track).ok_or(IntakeError::NoAudioTrack)?;

        info!(
            "Opened stream {} (track {}, time base {}/{})",
            url, track_id, time_base.numer, time_base.denom
        );

        Ok(Box::new(SymphoniaSource {
            format,
            track_id,
            time_base,
        }))
    }

    fn name(&self) -> &str {
        "symphonia"
    }
}

/// Packets of one audio track, straight from the container
struct SymphoniaSource {
    format: Box<dyn FormatReader>,
    track_id: u32,
    time_base: TimeBase,
}

impl PacketSource for SymphoniaSource {
    fn next_packet(&mut self) -> Result<Option<StreamPacket>, IntakeError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(None);
                }
                Err(err) => return Err(map_symphonia_error(err)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            return Ok(Some(StreamPacket {
                pts: PresentationTime::new(packet.ts(), self.time_base),
                data: packet.buf().to_vec(),
                corrupt: false,
            }));
        }
    }

    fn close(self: Box<Self>) {
        debug!("Closing stream (track {})", self.track_id);
    }
}

fn select_audio_track(format: &dyn FormatReader) -> Option<&Track> {
    format
        .default_track()
        .filter(|track| track.codec_params.sample_rate.is_some())
        .or_else(|| {
            format
                .tracks()
                .iter()
                .find(|track| track.codec_params.sample_rate.is_some())
        })
}

fn track_time_base(track: &Track) -> Option<TimeBase> {
    track.codec_params.time_base.or_else(|| {
        track
            .codec_params
            .sample_rate
            .filter(|rate| *rate > 0)
            .map(|rate| TimeBase::new(1, rate))
    })
}

fn map_symphonia_error(err: SymphoniaError) -> IntakeError {
    match err {
        SymphoniaError::IoError(err) => IntakeError::from(err),
        SymphoniaError::Unsupported(what) => IntakeError::Unsupported(what.to_string()),
        other => IntakeError::Demux(other.to_string()),
    }
}
