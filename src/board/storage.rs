use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;
use embedded_sdmmc::{Error, Mode, SdCard, SdCardError, TimeSource, Timestamp, VolumeIdx, VolumeManager};

use crate::datalog::{DataLog, LogRecord, LOG_FILE, LOG_HEADER};

/// File timestamps on the card; the log rows carry the real time
pub struct FixedTime;

impl TimeSource for FixedTime {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 54,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

/// CSV log on the first FAT volume of an SD card.
/// The file is opened and closed for every write so a power cut loses at
/// most the row being written.
pub struct SdLog<SPI, DELAY>
where
    SPI: SpiDevice<u8>,
    DELAY: DelayNs,
{
    volumes: VolumeManager<SdCard<SPI, DELAY>, FixedTime>,
}

impl<SPI, DELAY> SdLog<SPI, DELAY>
where
    SPI: SpiDevice<u8>,
    DELAY: DelayNs,
{
    pub fn new(card: SdCard<SPI, DELAY>) -> SdLog<SPI, DELAY> {
        Self {
            volumes: VolumeManager::new(card, FixedTime),
        }
    }

    /// Appends `bytes` to the log, only if the file is empty when
    /// `only_if_empty` is set
    fn append(&mut self, bytes: &[u8], only_if_empty: bool) -> Result<(), Error<SdCardError>> {
        let volume = self.volumes.open_volume(VolumeIdx(0))?;
        let root = volume.open_root_dir()?;
        let file = root.open_file_in_dir(LOG_FILE, Mode::ReadWriteCreateOrAppend)?;

        if !only_if_empty || file.length() == 0 {
            file.write(bytes)?;
        }

        file.close()?;
        root.close()?;
        volume.close()
    }
}

impl<SPI, DELAY> DataLog for SdLog<SPI, DELAY>
where
    SPI: SpiDevice<u8>,
    DELAY: DelayNs,
{
    type Error = Error<SdCardError>;

    fn ensure_header(&mut self) -> Result<(), Self::Error> {
        self.append(LOG_HEADER.as_bytes(), true)
    }

    fn append_record(&mut self, record: &LogRecord) -> Result<(), Self::Error> {
        self.append(record.to_csv_line().as_bytes(), false)
    }
}
