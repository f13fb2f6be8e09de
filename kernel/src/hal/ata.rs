//! ATA/IDE Driver
//!
//! Implements the ATA disk driver using PIO mode with 28-bit LBA.
//! Drives the master device of one IDE channel; interrupts are masked
//! at the controller and every wait is a bounded status-register poll.
//!
//! # I/O Ports
//! Primary channel: 0x1F0-0x1F7, control at 0x3F6
//!
//! # Commands
//! - IDENTIFY (0xEC): Get device information
//! - READ SECTORS (0x20): Read sectors in PIO mode
//! - WRITE SECTORS (0x30): Write sectors in PIO mode
//! - FLUSH CACHE (0xE7): Flush write cache
//!
//! # Per-sector state machine
//! ```text
//! NotBusy ──command──► Busy ──► DataReady ──256 words──► NotBusy
//!                        │           │
//!                  budget spent   ERR/DF set
//!                        ▼           ▼
//!                  DeviceTimeout  DeviceError
//! ```
//! A failure aborts the whole command. Sectors moved before the failing
//! one stay written.

use crate::error::{StorageError, StorageResult};
use crate::io::block::{check_transfer, BlockDevice, SECTOR_SIZE};

/// IDE channel ports
pub mod ide_ports {
    pub const PRIMARY_DATA: u16 = 0x1F0;
    pub const PRIMARY_CONTROL: u16 = 0x3F6;
}

/// Register offsets from the channel base
pub mod ata_reg {
    pub const DATA: u16 = 0;
    pub const ERROR: u16 = 1;        // Read
    pub const SECTOR_COUNT: u16 = 2;
    pub const LBA_LO: u16 = 3;
    pub const LBA_MID: u16 = 4;
    pub const LBA_HI: u16 = 5;
    pub const DRIVE: u16 = 6;
    pub const STATUS: u16 = 7;       // Read
    pub const COMMAND: u16 = 7;      // Write
}

/// ATA commands
pub mod ata_cmd {
    pub const IDENTIFY: u8 = 0xEC;
    pub const READ_SECTORS: u8 = 0x20;
    pub const WRITE_SECTORS: u8 = 0x30;
    pub const FLUSH_CACHE: u8 = 0xE7;
}

/// Drive/head register values
pub mod drive_select {
    /// Master drive, CHS addressing (used before IDENTIFY)
    pub const MASTER: u8 = 0xA0;
    /// Master drive, LBA addressing; low nibble carries LBA bits 24-27
    pub const MASTER_LBA: u8 = 0xE0;
}

/// Device control register: nIEN (no interrupts)
pub const CONTROL_NIEN: u8 = 0x02;

/// 16-bit words per sector
pub const WORDS_PER_SECTOR: usize = SECTOR_SIZE / 2;

/// Default status poll budget (iterations, not time)
pub const DEFAULT_POLL_BUDGET: u32 = 100_000;

bitflags::bitflags! {
    /// ATA status register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AtaStatus: u8 {
        /// Error
        const ERR = 0x01;
        /// Data request
        const DRQ = 0x08;
        /// Drive fault
        const DF = 0x20;
        /// Ready
        const RDY = 0x40;
        /// Busy
        const BSY = 0x80;
    }
}

/// Raw port access for one IDE channel.
///
/// The real implementation executes `in`/`out` instructions; tests plug in
/// a simulated controller.
pub trait AtaPorts {
    fn read_u8(&mut self, port: u16) -> u8;
    fn write_u8(&mut self, port: u16, value: u8);
    fn read_u16(&mut self, port: u16) -> u16;
    fn write_u16(&mut self, port: u16, value: u16);

    /// Read a block of words from the data port
    fn read_words(&mut self, port: u16, buf: &mut [u16]) {
        for word in buf.iter_mut() {
            *word = self.read_u16(port);
        }
    }

    /// Write a block of words to the data port
    fn write_words(&mut self, port: u16, buf: &[u16]) {
        for &word in buf {
            self.write_u16(port, word);
        }
    }
}

/// IDE channel information.
///
/// Only the primary channel can be constructed; it is the one the driver
/// supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdeChannel {
    base: u16,
    control: u16,
}

impl IdeChannel {
    pub const fn primary() -> Self {
        Self {
            base: ide_ports::PRIMARY_DATA,
            control: ide_ports::PRIMARY_CONTROL,
        }
    }

    /// Task-file base port (data register)
    pub const fn base(&self) -> u16 {
        self.base
    }

    /// Device control / alternate status port
    pub const fn control(&self) -> u16 {
        self.control
    }

    /// Absolute port of a task-file register
    #[inline]
    pub const fn reg(&self, offset: u16) -> u16 {
        self.base + offset
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtaConfig {
    /// Channel the master drive sits on (primary only)
    pub channel: IdeChannel,
    /// Status reads allowed per wait before reporting a timeout
    pub poll_budget: u32,
}

impl Default for AtaConfig {
    fn default() -> Self {
        Self {
            channel: IdeChannel::primary(),
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }
}

/// Information returned by IDENTIFY DEVICE
#[derive(Clone, Copy)]
pub struct AtaIdentity {
    pub model: [u8; 40],
    pub serial: [u8; 20],
    pub firmware: [u8; 8],
    /// Addressable sectors in 28-bit LBA mode
    pub total_sectors: u32,
    pub lba48: bool,
}

impl AtaIdentity {
    pub fn model_str(&self) -> &str {
        trimmed_str(&self.model)
    }

    pub fn serial_str(&self) -> &str {
        trimmed_str(&self.serial)
    }

    pub fn firmware_str(&self) -> &str {
        trimmed_str(&self.firmware)
    }

    /// Size in megabytes
    pub fn size_mb(&self) -> u64 {
        self.total_sectors as u64 * SECTOR_SIZE as u64 / (1024 * 1024)
    }
}

impl core::fmt::Debug for AtaIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtaIdentity")
            .field("model", &self.model_str())
            .field("serial", &self.serial_str())
            .field("firmware", &self.firmware_str())
            .field("total_sectors", &self.total_sectors)
            .field("lba48", &self.lba48)
            .finish()
    }
}

fn trimmed_str(bytes: &[u8]) -> &str {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map(|p| p + 1)
        .unwrap_or(0);
    core::str::from_utf8(&bytes[..end]).unwrap_or("")
}

/// Copy an IDENTIFY string field (byte-swapped words)
fn copy_identify_string(data: &[u16; WORDS_PER_SECTOR], first_word: usize, out: &mut [u8]) {
    for (i, pair) in out.chunks_exact_mut(2).enumerate() {
        let word = data[first_word + i];
        pair[0] = (word >> 8) as u8;
        pair[1] = (word & 0xFF) as u8;
    }
}

/// Parse IDENTIFY data
fn parse_identify_data(data: &[u16; WORDS_PER_SECTOR]) -> AtaIdentity {
    let mut identity = AtaIdentity {
        model: [0; 40],
        serial: [0; 20],
        firmware: [0; 8],
        total_sectors: 0,
        lba48: false,
    };

    // Words 10-19: serial, 23-26: firmware, 27-46: model
    copy_identify_string(data, 10, &mut identity.serial);
    copy_identify_string(data, 23, &mut identity.firmware);
    copy_identify_string(data, 27, &mut identity.model);

    // Word 83 bit 10: LBA48 command set
    identity.lba48 = (data[83] & (1 << 10)) != 0;

    // Words 60-61: LBA28 sector count
    identity.total_sectors = (data[61] as u32) << 16 | data[60] as u32;

    identity
}

/// ATA master drive driven by polled PIO
pub struct AtaDisk<P: AtaPorts> {
    ports: P,
    config: AtaConfig,
    identity: Option<AtaIdentity>,
}

impl<P: AtaPorts> AtaDisk<P> {
    /// Driver for the primary master with the default poll budget
    pub fn new(ports: P) -> Self {
        Self::with_config(ports, AtaConfig::default())
    }

    pub fn with_config(ports: P, config: AtaConfig) -> Self {
        Self {
            ports,
            config,
            identity: None,
        }
    }

    pub fn config(&self) -> &AtaConfig {
        &self.config
    }

    /// IDENTIFY result, once `initialize` has succeeded
    pub fn identity(&self) -> Option<&AtaIdentity> {
        self.identity.as_ref()
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }

    pub fn into_ports(self) -> P {
        self.ports
    }

    // ========================================================================
    // Low-level I/O
    // ========================================================================

    #[inline]
    fn status(&mut self) -> AtaStatus {
        let port = self.config.channel.reg(ata_reg::STATUS);
        AtaStatus::from_bits_retain(self.ports.read_u8(port))
    }

    /// 400ns delay (read alternate status 4 times)
    fn delay(&mut self) {
        let control = self.config.channel.control;
        for _ in 0..4 {
            let _ = self.ports.read_u8(control);
        }
    }

    /// Wait for BSY to clear
    fn wait_not_busy(&mut self) -> StorageResult<()> {
        for _ in 0..self.config.poll_budget {
            if !self.status().contains(AtaStatus::BSY) {
                return Ok(());
            }
        }
        Err(StorageError::DeviceTimeout)
    }

    /// Wait for DRQ to set, failing on ERR/DF
    fn wait_data_ready(&mut self) -> StorageResult<()> {
        for _ in 0..self.config.poll_budget {
            let status = self.status();
            if status.contains(AtaStatus::BSY) {
                continue;
            }
            if status.intersects(AtaStatus::ERR | AtaStatus::DF) {
                return Err(StorageError::DeviceError);
            }
            if status.contains(AtaStatus::DRQ) {
                return Ok(());
            }
        }
        Err(StorageError::DeviceTimeout)
    }

    fn command(&mut self, cmd: u8) {
        let port = self.config.channel.reg(ata_reg::COMMAND);
        self.ports.write_u8(port, cmd);
    }

    /// Program drive/head, sector count and LBA registers, then issue `cmd`
    fn start_transfer(&mut self, lba: u32, count: u32, cmd: u8) -> StorageResult<()> {
        self.wait_not_busy()?;

        let ch = self.config.channel;
        let drive = drive_select::MASTER_LBA | ((lba >> 24) & 0x0F) as u8;
        self.ports.write_u8(ch.reg(ata_reg::DRIVE), drive);
        // 256 sectors is encoded as 0
        self.ports.write_u8(ch.reg(ata_reg::SECTOR_COUNT), (count & 0xFF) as u8);
        self.ports.write_u8(ch.reg(ata_reg::LBA_LO), (lba & 0xFF) as u8);
        self.ports.write_u8(ch.reg(ata_reg::LBA_MID), ((lba >> 8) & 0xFF) as u8);
        self.ports.write_u8(ch.reg(ata_reg::LBA_HI), ((lba >> 16) & 0xFF) as u8);
        self.command(cmd);
        Ok(())
    }

    // ========================================================================
    // IDENTIFY Command
    // ========================================================================

    /// Select the master drive and run IDENTIFY DEVICE
    pub fn identify(&mut self) -> StorageResult<AtaIdentity> {
        let ch = self.config.channel;

        // Polling only: keep the drive from raising IRQ14
        self.ports.write_u8(ch.control, CONTROL_NIEN);

        self.ports.write_u8(ch.reg(ata_reg::DRIVE), drive_select::MASTER);
        self.delay();
        self.wait_not_busy()?;

        self.command(ata_cmd::IDENTIFY);
        self.delay();
        self.wait_not_busy()?;
        self.wait_data_ready()?;

        let mut data = [0u16; WORDS_PER_SECTOR];
        self.ports.read_words(ch.reg(ata_reg::DATA), &mut data);

        Ok(parse_identify_data(&data))
    }
}

impl<P: AtaPorts> BlockDevice for AtaDisk<P> {
    fn initialize(&mut self) -> StorageResult<()> {
        let identity = self.identify()?;
        log::info!(
            "ATA primary master: {} ({} MB, LBA48: {})",
            identity.model_str(),
            identity.size_mb(),
            if identity.lba48 { "yes" } else { "no" }
        );
        self.identity = Some(identity);
        Ok(())
    }

    fn read_sectors(&mut self, lba: u32, count: u32, buf: &mut [u8]) -> StorageResult<()> {
        let bytes = check_transfer(lba, count, buf.len())?;

        self.start_transfer(lba, count, ata_cmd::READ_SECTORS)?;

        let data_port = self.config.channel.reg(ata_reg::DATA);
        let mut words = [0u16; WORDS_PER_SECTOR];
        for sector in buf[..bytes].chunks_exact_mut(SECTOR_SIZE) {
            self.wait_not_busy()?;
            self.wait_data_ready()?;

            self.ports.read_words(data_port, &mut words);
            for (pair, word) in sector.chunks_exact_mut(2).zip(words.iter()) {
                pair.copy_from_slice(&word.to_le_bytes());
            }
        }

        Ok(())
    }

    fn write_sectors(&mut self, lba: u32, count: u32, buf: &[u8]) -> StorageResult<()> {
        let bytes = check_transfer(lba, count, buf.len())?;

        self.start_transfer(lba, count, ata_cmd::WRITE_SECTORS)?;

        let data_port = self.config.channel.reg(ata_reg::DATA);
        let mut words = [0u16; WORDS_PER_SECTOR];
        for sector in buf[..bytes].chunks_exact(SECTOR_SIZE) {
            self.wait_data_ready()?;

            for (word, pair) in words.iter_mut().zip(sector.chunks_exact(2)) {
                *word = u16::from_le_bytes([pair[0], pair[1]]);
            }
            self.ports.write_words(data_port, &words);

            self.command(ata_cmd::FLUSH_CACHE);
            self.wait_not_busy()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    const BASE: u16 = ide_ports::PRIMARY_DATA;

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    enum Phase {
        Idle,
        Identify { word: usize },
        Read { lba: u32, sector: u32, total: u32, word: usize },
        Write { lba: u32, sector: u32, total: u32, word: usize },
        Failed,
    }

    /// Simulated primary channel with a master disk behind it
    struct SimChannel {
        disk: Vec<u8>,
        identify: [u16; WORDS_PER_SECTOR],
        phase: Phase,
        drive: u8,
        count: u8,
        lba: [u8; 3],
        /// Status reads that report BSY after each command or sector
        busy_reads: u32,
        pending_busy: u32,
        /// BSY never clears
        stuck_busy: bool,
        /// BSY never clears once a flush is issued
        hang_on_flush: bool,
        /// DRQ is never raised
        no_drq: bool,
        /// Raise ERR instead of DRQ when this sector is reached
        fail_at_sector: Option<u32>,
        accesses: usize,
        commands: Vec<u8>,
    }

    impl SimChannel {
        fn new(sectors: usize) -> Self {
            let mut identify = [0u16; WORDS_PER_SECTOR];
            // Model string is stored byte-swapped in words 27-46
            let mut model = [b' '; 40];
            model[..13].copy_from_slice(b"QEMU HARDDISK");
            for i in 0..20 {
                identify[27 + i] = (model[i * 2] as u16) << 8 | model[i * 2 + 1] as u16;
            }
            identify[60] = (sectors & 0xFFFF) as u16;
            identify[61] = (sectors >> 16) as u16;
            identify[83] = 1 << 10;

            Self {
                disk: vec![0u8; sectors * SECTOR_SIZE],
                identify,
                phase: Phase::Idle,
                drive: 0,
                count: 0,
                lba: [0; 3],
                busy_reads: 3,
                pending_busy: 0,
                stuck_busy: false,
                hang_on_flush: false,
                no_drq: false,
                fail_at_sector: None,
                accesses: 0,
                commands: Vec::new(),
            }
        }

        fn current_lba(&self) -> u32 {
            ((self.drive & 0x0F) as u32) << 24
                | (self.lba[2] as u32) << 16
                | (self.lba[1] as u32) << 8
                | self.lba[0] as u32
        }

        fn total(&self) -> u32 {
            if self.count == 0 { 256 } else { self.count as u32 }
        }

        fn enter_sector(&mut self, sector: u32) {
            self.pending_busy = self.busy_reads;
            if self.fail_at_sector == Some(sector) {
                self.phase = Phase::Failed;
            }
        }

        fn status_bits(&mut self) -> u8 {
            if self.stuck_busy {
                return AtaStatus::BSY.bits();
            }
            if self.pending_busy > 0 {
                self.pending_busy -= 1;
                return AtaStatus::BSY.bits();
            }
            let data = if self.no_drq { AtaStatus::empty() } else { AtaStatus::DRQ };
            let status = match self.phase {
                Phase::Idle => AtaStatus::RDY,
                Phase::Failed => AtaStatus::RDY | AtaStatus::ERR,
                _ => AtaStatus::RDY | data,
            };
            status.bits()
        }
    }

    impl AtaPorts for SimChannel {
        fn read_u8(&mut self, port: u16) -> u8 {
            self.accesses += 1;
            match port {
                p if p == BASE + ata_reg::STATUS => self.status_bits(),
                ide_ports::PRIMARY_CONTROL => {
                    // Alternate status does not consume busy reads
                    if self.stuck_busy || self.pending_busy > 0 { AtaStatus::BSY.bits() } else { 0 }
                }
                _ => 0,
            }
        }

        fn write_u8(&mut self, port: u16, value: u8) {
            self.accesses += 1;
            match port - BASE {
                _ if port == ide_ports::PRIMARY_CONTROL => {}
                ata_reg::SECTOR_COUNT => self.count = value,
                ata_reg::LBA_LO => self.lba[0] = value,
                ata_reg::LBA_MID => self.lba[1] = value,
                ata_reg::LBA_HI => self.lba[2] = value,
                ata_reg::DRIVE => self.drive = value,
                ata_reg::COMMAND => {
                    self.commands.push(value);
                    match value {
                        ata_cmd::IDENTIFY => {
                            self.phase = Phase::Identify { word: 0 };
                            self.pending_busy = self.busy_reads;
                        }
                        ata_cmd::READ_SECTORS => {
                            self.phase = Phase::Read {
                                lba: self.current_lba(),
                                sector: 0,
                                total: self.total(),
                                word: 0,
                            };
                            self.enter_sector(0);
                        }
                        ata_cmd::WRITE_SECTORS => {
                            self.phase = Phase::Write {
                                lba: self.current_lba(),
                                sector: 0,
                                total: self.total(),
                                word: 0,
                            };
                            self.enter_sector(0);
                        }
                        ata_cmd::FLUSH_CACHE => {
                            if self.hang_on_flush {
                                self.stuck_busy = true;
                            } else {
                                self.pending_busy = self.busy_reads;
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        fn read_u16(&mut self, port: u16) -> u16 {
            self.accesses += 1;
            assert_eq!(port, BASE + ata_reg::DATA);
            match self.phase {
                Phase::Identify { word } => {
                    let value = self.identify[word];
                    self.phase = if word + 1 == WORDS_PER_SECTOR {
                        Phase::Idle
                    } else {
                        Phase::Identify { word: word + 1 }
                    };
                    value
                }
                Phase::Read { lba, sector, total, word } => {
                    let offset = (lba + sector) as usize * SECTOR_SIZE + word * 2;
                    let value = u16::from_le_bytes([self.disk[offset], self.disk[offset + 1]]);
                    if word + 1 < WORDS_PER_SECTOR {
                        self.phase = Phase::Read { lba, sector, total, word: word + 1 };
                    } else if sector + 1 < total {
                        self.phase = Phase::Read { lba, sector: sector + 1, total, word: 0 };
                        self.enter_sector(sector + 1);
                    } else {
                        self.phase = Phase::Idle;
                    }
                    value
                }
                _ => panic!("data read outside a transfer"),
            }
        }

        fn write_u16(&mut self, port: u16, value: u16) {
            self.accesses += 1;
            assert_eq!(port, BASE + ata_reg::DATA);
            match self.phase {
                Phase::Write { lba, sector, total, word } => {
                    let offset = (lba + sector) as usize * SECTOR_SIZE + word * 2;
                    self.disk[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
                    if word + 1 < WORDS_PER_SECTOR {
                        self.phase = Phase::Write { lba, sector, total, word: word + 1 };
                    } else if sector + 1 < total {
                        self.phase = Phase::Write { lba, sector: sector + 1, total, word: 0 };
                        self.enter_sector(sector + 1);
                    } else {
                        self.phase = Phase::Idle;
                    }
                }
                _ => panic!("data write outside a transfer"),
            }
        }
    }

    fn small_budget() -> AtaConfig {
        AtaConfig {
            poll_budget: 64,
            ..AtaConfig::default()
        }
    }

    fn pattern(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    #[test]
    fn test_initialize_parses_identify() {
        let mut disk = AtaDisk::new(SimChannel::new(2048));
        disk.initialize().unwrap();

        let identity = disk.identity().unwrap();
        assert_eq!(identity.model_str(), "QEMU HARDDISK");
        assert_eq!(identity.total_sectors, 2048);
        assert!(identity.lba48);
        assert_eq!(disk.ports().commands, vec![ata_cmd::IDENTIFY]);
    }

    #[test]
    fn test_initialize_times_out_when_busy_never_clears() {
        let mut sim = SimChannel::new(16);
        sim.stuck_busy = true;
        let mut disk = AtaDisk::with_config(sim, small_budget());
        assert_eq!(disk.initialize(), Err(StorageError::DeviceTimeout));
        assert!(disk.identity().is_none());
    }

    #[test]
    fn test_initialize_times_out_without_data_request() {
        let mut sim = SimChannel::new(16);
        sim.no_drq = true;
        let mut disk = AtaDisk::with_config(sim, small_budget());
        assert_eq!(disk.initialize(), Err(StorageError::DeviceTimeout));
    }

    #[test]
    fn test_round_trip_single_and_multi_sector() {
        let mut disk = AtaDisk::new(SimChannel::new(1024));
        for (lba, count) in [(0u32, 1u32), (5, 3), (100, 255), (300, 256)] {
            let data = pattern(count as usize * SECTOR_SIZE, count as u8);
            disk.write_sectors(lba, count, &data).unwrap();

            let mut read = vec![0u8; data.len()];
            disk.read_sectors(lba, count, &mut read).unwrap();
            assert_eq!(read, data, "lba {} count {}", lba, count);
        }
    }

    #[test]
    fn test_register_programming() {
        let mut disk = AtaDisk::new(SimChannel::new(16));
        let mut buf = vec![0u8; 256 * SECTOR_SIZE];
        // First sector fails; the task file is already programmed by then
        let lba = 0x0A12_3456;
        let sim = disk.ports_mut();
        sim.fail_at_sector = Some(0);
        assert_eq!(disk.read_sectors(lba, 256, &mut buf), Err(StorageError::DeviceError));

        let sim = disk.ports();
        assert_eq!(sim.drive, 0xE0 | 0x0A);
        assert_eq!(sim.count, 0);
        assert_eq!(sim.lba, [0x56, 0x34, 0x12]);
        assert_eq!(sim.commands, vec![ata_cmd::READ_SECTORS]);
    }

    #[test]
    fn test_invalid_count_touches_no_ports() {
        let mut disk = AtaDisk::new(SimChannel::new(16));
        let mut buf = vec![0u8; 300 * SECTOR_SIZE];

        assert_eq!(disk.read_sectors(0, 0, &mut buf), Err(StorageError::InvalidSectorCount));
        assert_eq!(disk.read_sectors(0, 257, &mut buf), Err(StorageError::InvalidSectorCount));
        assert_eq!(disk.write_sectors(0, 0, &buf), Err(StorageError::InvalidSectorCount));
        assert_eq!(disk.write_sectors(0, 300, &buf), Err(StorageError::InvalidSectorCount));
        assert_eq!(disk.read_sectors(0, 4, &mut buf[..1024]), Err(StorageError::BufferTooSmall));
        assert_eq!(disk.ports().accesses, 0);
    }

    #[test]
    fn test_error_bit_aborts_mid_transfer() {
        let mut sim = SimChannel::new(64);
        sim.fail_at_sector = Some(2);
        let mut disk = AtaDisk::new(sim);

        let data = pattern(4 * SECTOR_SIZE, 9);
        assert_eq!(disk.write_sectors(10, 4, &data), Err(StorageError::DeviceError));

        // Sectors before the failure stay written, no rollback
        let sim = disk.ports();
        assert_eq!(&sim.disk[10 * SECTOR_SIZE..12 * SECTOR_SIZE], &data[..2 * SECTOR_SIZE]);
        assert!(sim.disk[12 * SECTOR_SIZE..14 * SECTOR_SIZE].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_flush_after_every_written_sector() {
        let mut disk = AtaDisk::new(SimChannel::new(64));
        let data = pattern(3 * SECTOR_SIZE, 1);
        disk.write_sectors(0, 3, &data).unwrap();
        assert_eq!(
            disk.ports().commands,
            vec![
                ata_cmd::WRITE_SECTORS,
                ata_cmd::FLUSH_CACHE,
                ata_cmd::FLUSH_CACHE,
                ata_cmd::FLUSH_CACHE,
            ]
        );
    }

    #[test]
    fn test_flush_timeout_is_reported() {
        let mut sim = SimChannel::new(64);
        sim.hang_on_flush = true;
        let mut disk = AtaDisk::with_config(sim, small_budget());
        let data = pattern(SECTOR_SIZE, 3);
        assert_eq!(disk.write_sectors(0, 1, &data), Err(StorageError::DeviceTimeout));
    }

    #[test]
    fn test_default_config_drives_primary_channel() {
        let config = AtaConfig::default();
        assert_eq!(config.channel, IdeChannel::primary());
        assert_eq!(config.channel.base(), 0x1F0);
        assert_eq!(config.channel.control(), 0x3F6);
        assert_eq!(config.channel.reg(ata_reg::STATUS), 0x1F7);
        assert_eq!(config.poll_budget, DEFAULT_POLL_BUDGET);
    }

    #[test]
    fn test_parse_identify_strings() {
        let mut data = [0u16; WORDS_PER_SECTOR];
        data[10] = u16::from_be_bytes(*b"AB");
        data[11] = u16::from_be_bytes(*b"C ");
        data[23] = u16::from_be_bytes(*b"1.");
        data[24] = u16::from_be_bytes(*b"0 ");
        let identity = parse_identify_data(&data);
        assert_eq!(identity.serial_str(), "ABC");
        assert_eq!(identity.firmware_str(), "1.0");
        assert!(!identity.lba48);
    }
}
