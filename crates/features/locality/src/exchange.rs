//! Unit locality exchange.
//!
//! Every unit probes its own hardware, encodes it into a fixed-size record and the
//! team all-gathers the records. A record starts with a status byte so that a unit
//! whose probe or encoding failed still takes part in the gather; the failure then
//! surfaces on every unit instead of leaving the others blocked.

use crate::error::{LocalityError, LocalityErrorExt};
use serde::Serialize;
use strata_domain::constants::{MAX_HOST_LEN, UNIT_RECORD_SIZE};
use strata_domain::{TeamId, UnitId, UnitLocality};
use strata_kernel::probe::HardwareProbe;
use strata_transport::Collective;
use tracing::{debug, trace, warn};

const RECORD_VALID: u8 = 1;
const RECORD_FAILED: u8 = 0;

/// Locality of every unit of a team, indexed by unit id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UnitMapping {
    units: Vec<UnitLocality>,
}

impl UnitMapping {
    /// Builds a mapping from records ordered by unit id.
    ///
    /// # Errors
    /// [`LocalityError::InvalidRecord`] if a record's unit id differs from its position
    /// or its host name is empty or longer than [`MAX_HOST_LEN`].
    pub fn from_records(units: Vec<UnitLocality>) -> Result<Self, LocalityError> {
        for (position, unit) in units.iter().enumerate() {
            if unit.unit.index() != position {
                return Err(LocalityError::InvalidRecord {
                    message: format!("record at position {position} claims {}", unit.unit).into(),
                    context: None,
                });
            }
            validate_host(&unit.host).context(format!("record of {}", unit.unit))?;
        }
        Ok(Self { units })
    }

    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&UnitLocality> {
        self.units.get(unit.index())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UnitLocality> {
        self.units.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[UnitLocality] {
        &self.units
    }
}

impl<'a> IntoIterator for &'a UnitMapping {
    type Item = &'a UnitLocality;
    type IntoIter = std::slice::Iter<'a, UnitLocality>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

fn validate_host(host: &str) -> Result<(), LocalityError> {
    if host.is_empty() {
        return Err(LocalityError::InvalidRecord { message: "host name is empty".into(), context: None });
    }
    if host.len() > MAX_HOST_LEN {
        return Err(LocalityError::RecordTooLarge {
            message: format!("host name of {} bytes exceeds {MAX_HOST_LEN}", host.len()).into(),
            context: None,
        });
    }
    Ok(())
}

/// Encodes one unit's locality into a record of exactly [`UNIT_RECORD_SIZE`] bytes.
///
/// # Errors
/// [`LocalityError::RecordTooLarge`] if the host name or the encoding does not fit,
/// [`LocalityError::InvalidRecord`] for an empty host name.
pub fn encode_record(locality: &UnitLocality) -> Result<Vec<u8>, LocalityError> {
    validate_host(&locality.host)?;

    let mut record = vec![0u8; UNIT_RECORD_SIZE];
    record[0] = RECORD_VALID;
    postcard::to_slice(locality, &mut record[1..]).map_err(|err| match err {
        postcard::Error::SerializeBufferFull => LocalityError::RecordTooLarge {
            message: format!("encoding exceeds {UNIT_RECORD_SIZE} bytes").into(),
            context: None,
        },
        source => LocalityError::Record { source, context: Some("Encoding locality record".into()) },
    })?;
    Ok(record)
}

/// The record a unit contributes when it has nothing valid to share.
#[must_use]
pub fn failure_record() -> Vec<u8> {
    let mut record = vec![0u8; UNIT_RECORD_SIZE];
    record[0] = RECORD_FAILED;
    record
}

/// Decodes the concatenated records of a team of `team_size` units.
///
/// # Errors
/// [`LocalityError::PeerFailed`] if a unit contributed a failure record,
/// [`LocalityError::InvalidRecord`] if the buffer has the wrong length or an embedded
/// unit id does not match its position, [`LocalityError::Record`] if a record does
/// not decode.
pub fn decode_records(bytes: &[u8], team_size: usize) -> Result<UnitMapping, LocalityError> {
    if bytes.len() != team_size * UNIT_RECORD_SIZE {
        return Err(LocalityError::InvalidRecord {
            message: format!(
                "gathered {} bytes, expected {team_size} records of {UNIT_RECORD_SIZE}",
                bytes.len()
            )
            .into(),
            context: None,
        });
    }

    let mut units = Vec::with_capacity(team_size);
    for (position, chunk) in bytes.chunks_exact(UNIT_RECORD_SIZE).enumerate() {
        match chunk[0] {
            RECORD_VALID => {},
            RECORD_FAILED => {
                let unit = UnitId(u32::try_from(position).unwrap_or(u32::MAX));
                return Err(LocalityError::PeerFailed { unit, context: None });
            },
            status => {
                return Err(LocalityError::InvalidRecord {
                    message: format!("record of unit {position} has status {status:#04x}").into(),
                    context: None,
                });
            },
        }
        let unit: UnitLocality =
            postcard::from_bytes(&chunk[1..]).context(format!("Decoding record of unit {position}"))?;
        units.push(unit);
    }

    UnitMapping::from_records(units)
}

/// Exchanges locality records across `team` and returns the mapping of every unit.
///
/// Collective: every member of the team must call it. No state is kept on failure.
///
/// # Errors
/// [`LocalityError::Transport`] if a collective operation fails, [`LocalityError::Probe`]
/// if the local probe fails, or any record error raised by [`encode_record`] and
/// [`decode_records`].
pub async fn exchange<C, P>(collective: &C, probe: &P, team: TeamId) -> Result<UnitMapping, LocalityError>
where
    C: Collective,
    P: HardwareProbe,
{
    let team_size = collective.team_size(team).context("Querying team size")?;
    let me = collective.my_unit(team).context("Querying own unit id")?;

    let local = probe
        .local_hardware()
        .context("Probing local hardware")
        .and_then(|hardware| encode_record(&hardware.into_locality(me)));

    let (record, local_error) = match local {
        Ok(record) => (record, None),
        Err(err) => {
            warn!(team = %team, unit = %me, error = %err, "Contributing failure record");
            (failure_record(), Some(err))
        },
    };

    let gathered = collective.all_gather(team, &record).await.context("Gathering locality records")?;
    if let Some(err) = local_error {
        return Err(err);
    }

    let mapping = decode_records(&gathered, team_size).context(team.to_string())?;
    for unit in &mapping {
        trace!(team = %team, unit = %unit.unit, host = %unit.host, "Unit locality");
    }
    debug!(team = %team, units = mapping.len(), "Locality exchange complete");
    Ok(mapping)
}
