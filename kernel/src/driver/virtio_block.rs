use core::mem::size_of;

use log::info;
use spin::Mutex;

use crate::{
    config::{virtio_blk, virtio_reg, virtio_status, virtq, SECTOR_SIZE, VIRTIO_BLK_PADDR, VIRTQ_ENTRY_NUM},
    error::KernelResult,
    mm::alloc_page,
};

const VIRTIO_MAGIC: u32 = 0x74726976;
const VIRTIO_DEVICE_BLK: u32 = 2;

unsafe fn reg_read32(offset: usize) -> u32 {
    ((VIRTIO_BLK_PADDR + offset) as *const u32).read_volatile()
}

unsafe fn reg_read64(offset: usize) -> u64 {
    ((VIRTIO_BLK_PADDR + offset) as *const u64).read_volatile()
}

unsafe fn reg_write32(offset: usize, value: u32) {
    ((VIRTIO_BLK_PADDR + offset) as *mut u32).write_volatile(value);
}

unsafe fn reg_fetch_and_or32(offset: usize, value: u32) {
    reg_write32(offset, reg_read32(offset) | value);
}

#[repr(C)]
struct VirtqDesc {
    addr: u64,
    len: u32,
    flags: u16,
    next: u16,
}

#[repr(C)]
struct VirtqAvail {
    flags: u16,
    index: u16,
    ring: [u16; VIRTQ_ENTRY_NUM],
}

#[repr(C)]
struct VirtqUsedElem {
    id: u32,
    len: u32,
}

#[repr(C)]
struct VirtqUsed {
    flags: u16,
    index: u16,
    ring: [VirtqUsedElem; VIRTQ_ENTRY_NUM],
}

/// A single virtqueue: descriptor table, avail ring and used ring, laid out
/// contiguously in one allocated page exactly as the legacy MMIO transport
/// expects them (§3.3 — used ring is conventionally page-aligned, which a
/// whole dedicated page guarantees without extra padding fields).
#[repr(C)]
struct VirtQueue {
    descs: [VirtqDesc; VIRTQ_ENTRY_NUM],
    avail: VirtqAvail,
    used: VirtqUsed,
}

struct BlockRequestDesc {
    queue: *mut VirtQueue,
    last_used_index: u16,
}

unsafe impl Send for BlockRequestDesc {}

#[repr(C)]
struct VirtioBlkReq {
    kind: u32,
    reserved: u32,
    sector: u64,
    data: [u8; SECTOR_SIZE],
    status: u8,
}

struct BlockDevice {
    vq: BlockRequestDesc,
    req: *mut VirtioBlkReq,
    capacity_sectors: u64,
}

unsafe impl Send for BlockDevice {}

static BLOCK_DEVICE: Mutex<Option<BlockDevice>> = Mutex::new(None);

/// Performs the legacy MMIO handshake (§3.3): checks the magic/version/
/// device-id triplet, walks the ACK -> DRIVER -> FEATURES_OK -> queue-init
/// -> DRIVER_OK status sequence, then allocates the single request buffer
/// this driver ever uses.
pub fn init() -> KernelResult<()> {
    unsafe {
        assert_eq!(reg_read32(virtio_reg::MAGIC), VIRTIO_MAGIC, "virtio: invalid magic value");
        assert_eq!(reg_read32(virtio_reg::VERSION), 1, "virtio: invalid version");
        assert_eq!(
            reg_read32(virtio_reg::DEVICE_ID),
            VIRTIO_DEVICE_BLK,
            "virtio: invalid device id"
        );

        reg_write32(virtio_reg::DEVICE_STATUS, 0);
        reg_fetch_and_or32(virtio_reg::DEVICE_STATUS, virtio_status::ACK);
        reg_fetch_and_or32(virtio_reg::DEVICE_STATUS, virtio_status::DRIVER);
        reg_fetch_and_or32(virtio_reg::DEVICE_STATUS, virtio_status::FEATURES_OK);

        let queue_paddr = alloc_page()?.0;
        let queue = queue_paddr as *mut VirtQueue;
        (*queue).avail.index = 0;
        (*queue).used.index = 0;

        reg_write32(virtio_reg::QUEUE_SEL, 0);
        reg_write32(virtio_reg::QUEUE_NUM, VIRTQ_ENTRY_NUM as u32);
        reg_write32(virtio_reg::QUEUE_ALIGN, 0);
        reg_write32(virtio_reg::QUEUE_PFN, (queue_paddr / crate::config::PAGE_SIZE) as u32);

        reg_write32(virtio_reg::DEVICE_STATUS, virtio_status::DRIVER_OK);

        let capacity_sectors = reg_read64(virtio_reg::DEVICE_CONFIG);
        info!(
            "virtio-blk: capacity is {} bytes",
            capacity_sectors * SECTOR_SIZE as u64
        );

        let req_paddr = alloc_page()?.0;
        assert!(size_of::<VirtioBlkReq>() <= crate::config::PAGE_SIZE);

        *BLOCK_DEVICE.lock() = Some(BlockDevice {
            vq: BlockRequestDesc {
                queue,
                last_used_index: 0,
            },
            req: req_paddr as *mut VirtioBlkReq,
            capacity_sectors,
        });
    }
    Ok(())
}

unsafe fn kick(dev: &mut BlockDevice, desc_index: u16) {
    let queue = &mut *dev.vq.queue;
    let slot = (queue.avail.index as usize) % VIRTQ_ENTRY_NUM;
    queue.avail.ring[slot] = desc_index;
    queue.avail.index = queue.avail.index.wrapping_add(1);
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
    reg_write32(virtio_reg::QUEUE_NOTIFY, 0);
    dev.vq.last_used_index = dev.vq.last_used_index.wrapping_add(1);
}

unsafe fn is_busy(dev: &BlockDevice) -> bool {
    dev.vq.last_used_index != (*dev.vq.queue).used.index
}

/// Synchronously reads (`is_write = false`) or writes one 512-byte sector,
/// busy-polling the used ring for completion (§3.3, §3.5).
pub fn read_write_disk(buf: &mut [u8; SECTOR_SIZE], sector: u64, is_write: bool) {
    let mut guard = BLOCK_DEVICE.lock();
    let dev = guard.as_mut().expect("virtio-blk not initialized");

    if sector >= dev.capacity_sectors {
        log::warn!(
            "virtio: tried to read/write sector={}, but capacity is {}",
            sector,
            dev.capacity_sectors
        );
        return;
    }

    unsafe {
        let req = &mut *dev.req;
        req.sector = sector;
        req.kind = if is_write { virtio_blk::T_OUT } else { virtio_blk::T_IN };
        if is_write {
            req.data.copy_from_slice(buf);
        }

        let req_paddr = dev.req as usize as u64;
        let data_offset = core::mem::offset_of!(VirtioBlkReq, data) as u64;
        let status_offset = core::mem::offset_of!(VirtioBlkReq, status) as u64;

        let queue = &mut *dev.vq.queue;
        queue.descs[0].addr = req_paddr;
        queue.descs[0].len = (size_of::<u32>() * 2 + size_of::<u64>()) as u32;
        queue.descs[0].flags = virtq::DESC_F_NEXT;
        queue.descs[0].next = 1;

        queue.descs[1].addr = req_paddr + data_offset;
        queue.descs[1].len = SECTOR_SIZE as u32;
        queue.descs[1].flags = virtq::DESC_F_NEXT | if is_write { 0 } else { virtq::DESC_F_WRITE };
        queue.descs[1].next = 2;

        queue.descs[2].addr = req_paddr + status_offset;
        queue.descs[2].len = size_of::<u8>() as u32;
        queue.descs[2].flags = virtq::DESC_F_WRITE;

        kick(dev, 0);
        while is_busy(dev) {}

        let req = &mut *dev.req;
        if req.status != 0 {
            log::warn!(
                "virtio: warn: failed to read/write sector={} status={}",
                sector,
                req.status
            );
            return;
        }

        if !is_write {
            buf.copy_from_slice(&req.data);
        }
    }
}
