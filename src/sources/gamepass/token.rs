use std::fs;

use md5::{Digest, Md5};
use rand::Rng;
use tracing::debug;

const SYSFS_NET: &str = "/sys/class/net";
const MULTICAST_BIT: u64 = 0x0100_0000_0000;

/// Computes a `plid` player token: the MD5 hex digest of a 10-bit random value
/// followed by the hardware node id, both in decimal.
pub fn generate_plid<R: Rng + ?Sized>(rng: &mut R, node_id: u64) -> String {
    let rand_bits: u32 = rng.gen_range(0..1024);
    let seed = format!("{}{}", rand_bits, node_id);
    hex::encode(Md5::digest(seed.as_bytes()))
}

/// The host's MAC address as a 48-bit integer.
///
/// Falls back to a random 48-bit value with the multicast bit set when no
/// usable interface address is found, which cannot collide with a real MAC.
pub fn node_id() -> u64 {
    if let Some(mac) = read_interface_mac() {
        return mac;
    }

    debug!("No interface MAC address readable, using random node id");
    random_node_id(&mut rand::thread_rng())
}

pub(crate) fn random_node_id<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    (rng.gen_range(0..=0xFFFF_FFFF_FFFFu64)) | MULTICAST_BIT
}

fn read_interface_mac() -> Option<u64> {
    let mut interfaces: Vec<_> = fs::read_dir(SYSFS_NET)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name() != "lo")
        .map(|entry| entry.path())
        .collect();
    interfaces.sort();

    interfaces
        .iter()
        .filter_map(|iface| fs::read_to_string(iface.join("address")).ok())
        .filter_map(|addr| parse_mac(addr.trim()))
        .find(|&mac| mac != 0)
}

/// Parses `aa:bb:cc:dd:ee:ff` into its integer value.
pub(crate) fn parse_mac(addr: &str) -> Option<u64> {
    let octets: Vec<&str> = addr.split(':').collect();
    if octets.len() != 6 {
        return None;
    }

    octets.iter().try_fold(0u64, |acc, octet| {
        if octet.len() != 2 {
            return None;
        }
        u8::from_str_radix(octet, 16)
            .ok()
            .map(|byte| (acc << 8) | byte as u64)
    })
}
