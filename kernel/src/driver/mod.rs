pub mod virtio_block;
