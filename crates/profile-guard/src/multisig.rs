//! The multisig module: members propose batches of profile calls, and a
//! member with EXECUTE runs them once enough members have approved.
//!
//! A proposal is stored as two entries keyed by its 10-byte id: the
//! ABI-encoded target list and the ABI-encoded payload list. Executing a
//! proposal clears both in the same batch as its calls, so it can run once.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use profile_guard_core::keys::{self, MULTISIG_PROPOSAL_DATAS, MULTISIG_PROPOSAL_NONCE, MULTISIG_PROPOSAL_TARGETS, MULTISIG_QUORUM};
use profile_guard_core::{
    decode_address_array, decode_bytes_array, encode_address_array, encode_bytes_array, hash_message, keccak256, value,
    Address, BitMask, DataKey, Ed25519Recovery, Operation, ProposalId, SignerRecovery, WriteBatch,
};
use profile_guard_perms::permissions::multisig;
use profile_guard_perms::{has_permission, permissions_of, plan_add_permissions, plan_remove_permissions, PermissionTable};
use profile_guard_store::{DataRead, DataReadExt, DataStore};

use crate::config::MultisigSettings;
use crate::dao::setup::plan_grants;
use crate::error::{ProfileError, Result};
use crate::key_manager::KeyManager;
use crate::module::Module;
use crate::profile::UniversalProfile;

const TABLE: PermissionTable = PermissionTable::Multisig;

/// Domain tag mixed into approval digests.
const APPROVAL_DOMAIN: &[u8] = b"MultisigProposalApproval";

/// Keys of the target and payload entries of a proposal.
pub fn proposal_keys(id: &ProposalId) -> (DataKey, DataKey) {
    (
        keys::word_mapping(id.as_bytes(), &keys::name_word(MULTISIG_PROPOSAL_TARGETS)),
        keys::word_mapping(id.as_bytes(), &keys::name_word(MULTISIG_PROPOSAL_DATAS)),
    )
}

/// A stored proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    pub targets: Vec<Address>,
    pub payloads: Vec<Bytes>,
}

/// Write the quorum and the initial member table in one owner call.
pub fn initialize_multisig<S: DataStore>(
    profile: &UniversalProfile<S>,
    owner: &Address,
    settings: &MultisigSettings,
) -> Result<()> {
    settings.validate()?;

    let mut batch = WriteBatch::new();
    batch.put(keys::encode_singleton(MULTISIG_QUORUM), vec![settings.quorum]);
    let members = settings.members.iter().map(|m| (m.address, m.permissions));
    batch.extend(plan_grants(profile, TABLE, members)?);

    profile.apply_batch(owner, &batch)?;
    tracing::info!(profile = %profile.address(), quorum = settings.quorum, members = settings.members.len(), "multisig initialized");
    Ok(())
}

/// The multisig module.
pub struct Multisig<S: DataStore> {
    module: Module<S>,
    recovery: Arc<dyn SignerRecovery>,
}

impl<S: DataStore> Multisig<S> {
    pub fn new(address: Address, key_manager: Arc<KeyManager<S>>) -> Self {
        Self::with_recovery(address, key_manager, Arc::new(Ed25519Recovery))
    }

    pub fn with_recovery(
        address: Address,
        key_manager: Arc<KeyManager<S>>,
        recovery: Arc<dyn SignerRecovery>,
    ) -> Self {
        Self {
            module: Module::new(address, key_manager),
            recovery,
        }
    }

    pub fn address(&self) -> Address {
        self.module.address()
    }

    pub fn add_permissions(&self, acting_as: &Address, target: &Address, mask: &BitMask) -> Result<()> {
        self.module.submit(|profile| {
            self.module.authorize(TABLE, acting_as, &multisig::ADD_PERMISSION)?;
            Ok((plan_add_permissions(profile, TABLE, target, mask)?, ()))
        })?;
        tracing::info!(%acting_as, %target, permission = %TABLE.describe(mask), "multisig permissions added");
        Ok(())
    }

    pub fn remove_permissions(&self, acting_as: &Address, target: &Address, mask: &BitMask) -> Result<()> {
        self.module.submit(|profile| {
            self.module.authorize(TABLE, acting_as, &multisig::REMOVE_PERMISSION)?;
            Ok((plan_remove_permissions(profile, TABLE, target, mask)?, ()))
        })?;
        tracing::info!(%acting_as, %target, permission = %TABLE.describe(mask), "multisig permissions removed");
        Ok(())
    }

    pub fn permissions_of(&self, address: &Address) -> Result<BitMask> {
        Ok(permissions_of(self.module.profile(), TABLE, address)?)
    }

    /// Whether `address` may approve proposals.
    pub fn can_vote(&self, address: &Address) -> Result<bool> {
        Ok(has_permission(self.module.profile(), TABLE, address, &multisig::VOTE)?)
    }

    pub fn members(&self) -> Result<Vec<Address>> {
        Ok(TABLE.registry().members(self.module.profile())?)
    }

    /// Approval percentage; unset reads as zero.
    pub fn quorum(&self) -> Result<u8> {
        let raw = self.module.profile().get_uint(&keys::encode_singleton(MULTISIG_QUORUM))?;
        u8::try_from(raw)
            .ok()
            .filter(|q| *q <= 100)
            .ok_or_else(|| ProfileError::InvalidConfig(format!("stored quorum {} out of range", raw)))
    }

    /// Record `payloads[i]` to be sent to `targets[i]`, returning the new
    /// proposal's id.
    ///
    /// Every target must be the profile and every payload a call the key
    /// manager understands, so nothing is stored that could never run.
    pub fn propose_execution(&self, acting_as: &Address, targets: Vec<Address>, payloads: Vec<Bytes>) -> Result<ProposalId> {
        let calls = targets.len();
        let id = self.module.submit(|profile| {
            self.module.authorize(TABLE, acting_as, &multisig::PROPOSE)?;
            if targets.len() != payloads.len() {
                return Err(ProfileError::LengthMismatch {
                    keys: targets.len(),
                    values: payloads.len(),
                });
            }
            if targets.is_empty() {
                return Err(ProfileError::EmptyProposal);
            }
            decode_calls(&profile.address(), &targets, &payloads)?;

            let nonce_key = keys::encode_singleton(MULTISIG_PROPOSAL_NONCE);
            let nonce = profile.get_uint(&nonce_key)?;
            let encoded_targets = encode_address_array(&targets);
            let encoded_payloads = encode_bytes_array(&payloads);

            let mut preimage = value::encode_uint(nonce).to_vec();
            preimage.extend_from_slice(acting_as.as_bytes());
            preimage.extend_from_slice(&encoded_targets);
            preimage.extend_from_slice(&encoded_payloads);
            let hash = keccak256(&preimage);
            let mut id = [0u8; 10];
            id.copy_from_slice(&hash[..10]);
            let id = ProposalId::from_bytes(id);

            let (targets_key, payloads_key) = proposal_keys(&id);
            let mut batch = WriteBatch::new();
            batch
                .put(targets_key, encoded_targets)
                .put(payloads_key, encoded_payloads)
                .put(nonce_key, value::encode_uint(nonce + 1));
            Ok((batch, id))
        })?;

        tracing::info!(proposer = %acting_as, proposal = %id, calls, "proposal created");
        Ok(id)
    }

    /// Load a stored proposal.
    pub fn proposal(&self, id: &ProposalId) -> Result<Option<Proposal>> {
        let (targets_key, payloads_key) = proposal_keys(id);
        let raw = self.module.profile().get_many(&[targets_key, payloads_key])?;
        if raw[0].is_empty() {
            return Ok(None);
        }
        Ok(Some(Proposal {
            id: *id,
            targets: decode_address_array(&raw[0])?,
            payloads: decode_bytes_array(&raw[1])?,
        }))
    }

    /// The digest members sign (as a personal message) to approve `id`.
    pub fn approval_hash(&self, id: &ProposalId) -> [u8; 32] {
        let mut preimage = APPROVAL_DOMAIN.to_vec();
        preimage.extend_from_slice(self.module.profile().address().as_bytes());
        preimage.extend_from_slice(id.as_bytes());
        keccak256(&preimage)
    }

    /// Run a proposal's calls through the key manager, all or nothing, and
    /// clear it.
    ///
    /// `approvals` are member signatures over [`Self::approval_hash`]. Only
    /// distinct signers holding VOTE count; unreadable signatures are
    /// ignored.
    pub fn execute_proposal(&self, acting_as: &Address, id: &ProposalId, approvals: &[Bytes]) -> Result<()> {
        let calls = self.module.submit_operations(|profile| {
            self.module.authorize(TABLE, acting_as, &multisig::EXECUTE)?;
            let proposal = self.proposal(id)?.ok_or(ProfileError::ProposalNotFound(*id))?;
            self.check_quorum(id, approvals)?;

            let mut ops = decode_calls(&profile.address(), &proposal.targets, &proposal.payloads)?;
            let calls = ops.len();
            let (targets_key, payloads_key) = proposal_keys(id);
            ops.push(Operation::SetDataBatch {
                keys: vec![targets_key, payloads_key],
                values: vec![Bytes::new(), Bytes::new()],
            });
            Ok((ops, calls))
        })?;

        tracing::info!(executor = %acting_as, proposal = %id, calls, "proposal executed");
        Ok(())
    }

    fn check_quorum(&self, id: &ProposalId, approvals: &[Bytes]) -> Result<()> {
        let profile = self.module.profile();
        let quorum = self.quorum()?;
        let members = TABLE.registry().len(profile)?;
        let digest = hash_message(&self.approval_hash(id));

        let mut approvers = BTreeSet::new();
        for signature in approvals {
            match self.recovery.recover(&digest, signature) {
                Ok(signer) => {
                    if has_permission(profile, TABLE, &signer, &multisig::VOTE)? {
                        approvers.insert(signer);
                    } else {
                        tracing::debug!(%signer, proposal = %id, "approval from non-voter ignored");
                    }
                }
                Err(e) => tracing::debug!(proposal = %id, error = %e, "unreadable approval ignored"),
            }
        }

        let approvals = approvers.len();
        if (approvals as u128) * 100 >= u128::from(quorum) * members {
            tracing::debug!(proposal = %id, approvals, members, quorum, "quorum reached");
            Ok(())
        } else {
            tracing::warn!(proposal = %id, approvals, members, quorum, "quorum not reached");
            Err(ProfileError::QuorumNotReached {
                approvals,
                members,
                quorum,
            })
        }
    }
}

/// Decode each payload as a call on `profile`.
fn decode_calls(profile: &Address, targets: &[Address], payloads: &[Bytes]) -> Result<Vec<Operation>> {
    targets
        .iter()
        .zip(payloads)
        .map(|(target, payload)| {
            if target != profile {
                return Err(ProfileError::UnsupportedTarget(*target));
            }
            Ok(Operation::decode(payload)?)
        })
        .collect()
}
