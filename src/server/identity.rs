//! Client identity resolution
//!
//! Turns the raw Client Identifier option into the link-layer address
//! used for address synthesis. Only DUID types that embed a link-layer
//! address are usable; anything else is an unknown DUID.

use crate::protocol::dhcpv6::Duid;
use crate::protocol::HardwareAddr;
use crate::{Error, Result};
use tracing::trace;

type DuidDecoder = fn(&[u8]) -> Result<Duid>;

/// Decoders tried in order. LLT goes first: both layouts start with a
/// type code and hardware type, so the order decides ties.
const DUID_DECODERS: &[(&str, DuidDecoder)] =
    &[("DUID-LLT", Duid::parse_llt), ("DUID-LL", Duid::parse_ll)];

/// Identity of the client that sent a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub duid: Duid,
    pub hardware_addr: HardwareAddr,
}

/// Decode a Client Identifier option value.
///
/// Returns [`Error::UnknownDuid`] when no decoder accepts the value and
/// [`Error::InvalidHardwareAddr`] when the embedded link-layer address is
/// neither 6 nor 8 bytes long.
pub fn resolve(client_id: &[u8]) -> Result<ClientIdentity> {
    let duid = DUID_DECODERS
        .iter()
        .find_map(|(kind, decode)| {
            let duid = decode(client_id).ok()?;
            trace!(kind, "decoded client DUID");
            Some(duid)
        })
        .ok_or(Error::UnknownDuid)?;

    let hardware_addr = HardwareAddr::try_from(duid.link_layer_addr())?;

    Ok(ClientIdentity {
        duid,
        hardware_addr,
    })
}
