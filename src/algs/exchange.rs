//! Keyed collectives over a [`Communicator`].
//!
//! Every operation here is collective: all ranks must call it, in the same
//! order, with the same tag, even when they have nothing to send. Each
//! stage posts its receives, then its sends, waits for every receive
//! without returning early, and always drains the send handles before
//! reporting an error.

use std::collections::BTreeMap;

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{WireCount, cast_slice, decode_count, decode_ids, encode_ids};
use crate::mesh_error::MeshGenError;

/// Integer vectors keyed by peer rank.
pub type KeyedIds = BTreeMap<usize, Vec<u64>>;

/// Marker returned by [`Exchanger::pull`] for requests the answering rank
/// could not serve.
pub const INVALID_ID: u64 = u64::MAX;

/// Rank that gathers and scatters.
pub const ROOT: usize = 0;

pub struct Exchanger<'a, C: Communicator> {
    comm: &'a C,
}

impl<'a, C: Communicator> Exchanger<'a, C> {
    pub fn new(comm: &'a C) -> Self {
        Self { comm }
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    pub fn size(&self) -> usize {
        self.comm.size()
    }

    fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        let me = self.rank();
        (0..self.size()).filter(move |&r| r != me)
    }

    /// Deliver `outgoing[r]` to rank `r` for every `r`; return what arrived,
    /// keyed by sender. Empty vectors are not reported.
    ///
    /// Uses `tag` for the size round and `tag + 1` for the payload round.
    pub fn push(&self, outgoing: &KeyedIds, tag: CommTag) -> Result<KeyedIds, MeshGenError> {
        let me = self.rank();
        let mut incoming = KeyedIds::new();
        if let Some(own) = outgoing.get(&me).filter(|v| !v.is_empty()) {
            incoming.insert(me, own.clone());
        }
        if self.size() == 1 {
            return Ok(incoming);
        }

        let counts = self.exchange_counts(outgoing, tag)?;

        // payload round
        let mut pending_recvs = Vec::new();
        for (&peer, &n) in counts.iter().filter(|(_, n)| **n > 0) {
            let mut scratch = vec![0u8; n * std::mem::size_of::<u64>()];
            let h = self.comm.irecv(peer, tag.offset(1).as_u16(), &mut scratch);
            pending_recvs.push((peer, n, h));
        }
        let mut pending_sends = Vec::new();
        for peer in self.peers() {
            if let Some(ids) = outgoing.get(&peer).filter(|v| !v.is_empty()) {
                let wire = encode_ids(ids);
                pending_sends.push(self.comm.isend(peer, tag.offset(1).as_u16(), cast_slice(&wire)));
            }
        }

        let mut maybe_err = None;
        for (peer, n, h) in pending_recvs {
            let decoded = match h.wait() {
                Some(data) => decode_ids(&data),
                None => Err(format!("no payload from rank {peer}")),
            };
            match decoded {
                Ok(ids) if ids.len() == n => {
                    incoming.insert(peer, ids);
                }
                Ok(ids) if maybe_err.is_none() => {
                    maybe_err = Some(MeshGenError::comm(
                        peer,
                        format!("announced {n} ids, received {}", ids.len()),
                    ));
                }
                Err(reason) if maybe_err.is_none() => {
                    maybe_err = Some(MeshGenError::comm(peer, reason));
                }
                _ => {} // already failing; just drain
            }
        }

        for send in pending_sends {
            let _ = send.wait();
        }

        match maybe_err {
            Some(err) => Err(err),
            None => Ok(incoming),
        }
    }

    // Every rank tells every other rank how many ids follow.
    fn exchange_counts(
        &self,
        outgoing: &KeyedIds,
        tag: CommTag,
    ) -> Result<BTreeMap<usize, usize>, MeshGenError> {
        let mut pending_recvs = Vec::new();
        for peer in self.peers() {
            let mut scratch = [0u8; std::mem::size_of::<WireCount>()];
            pending_recvs.push((peer, self.comm.irecv(peer, tag.as_u16(), &mut scratch)));
        }

        let mut pending_sends = Vec::new();
        for peer in self.peers() {
            let count = WireCount::new(outgoing.get(&peer).map_or(0, Vec::len));
            pending_sends.push(self.comm.isend(
                peer,
                tag.as_u16(),
                cast_slice(std::slice::from_ref(&count)),
            ));
        }

        let mut counts = BTreeMap::new();
        let mut maybe_err = None;
        for (peer, h) in pending_recvs {
            let decoded = match h.wait() {
                Some(data) => decode_count(&data),
                None => Err(format!("failed to receive size from rank {peer}")),
            };
            match decoded {
                Ok(n) => {
                    counts.insert(peer, n);
                }
                Err(reason) if maybe_err.is_none() => {
                    maybe_err = Some(MeshGenError::comm(peer, reason));
                }
                Err(_) => {}
            }
        }

        for send in pending_sends {
            let _ = send.wait();
        }

        match maybe_err {
            Some(err) => Err(err),
            None => Ok(counts),
        }
    }

    /// Request/response round.
    ///
    /// `requests[r]` goes to rank `r`, which answers each entry with
    /// `answer(requester, id)`. The result maps every peer asked to its
    /// answers, aligned with the request order. A failed answer is sent
    /// back as [`INVALID_ID`] so that the requester is never left waiting;
    /// the answering rank then returns the first such error after the
    /// round completes.
    ///
    /// Uses tags `tag .. tag + 3`.
    pub fn pull<F>(
        &self,
        requests: &KeyedIds,
        tag: CommTag,
        mut answer: F,
    ) -> Result<KeyedIds, MeshGenError>
    where
        F: FnMut(usize, u64) -> Result<u64, MeshGenError>,
    {
        let asked = self.push(requests, tag)?;

        let mut local_err = None;
        let mut responses = KeyedIds::new();
        for (&from, ids) in &asked {
            let replies = ids
                .iter()
                .map(|&id| match answer(from, id) {
                    Ok(v) => v,
                    Err(e) => {
                        local_err.get_or_insert(e);
                        INVALID_ID
                    }
                })
                .collect();
            responses.insert(from, replies);
        }

        let replies = self.push(&responses, tag.offset(2))?;
        if let Some(err) = local_err {
            return Err(err);
        }

        let mut out = KeyedIds::new();
        for (&peer, ids) in requests.iter().filter(|(_, v)| !v.is_empty()) {
            let got = replies.get(&peer).map_or(0, Vec::len);
            if got != ids.len() {
                return Err(MeshGenError::comm(
                    peer,
                    format!("asked {} ids, got {got} answers", ids.len()),
                ));
            }
            out.insert(peer, replies.get(&peer).cloned().unwrap_or_default());
        }
        Ok(out)
    }

    /// Collect every rank's `local` on [`ROOT`], indexed by rank.
    /// Other ranks get `None`.
    pub fn gather_to_root(
        &self,
        local: &[u64],
        tag: CommTag,
    ) -> Result<Option<Vec<Vec<u64>>>, MeshGenError> {
        let mut outgoing = KeyedIds::new();
        outgoing.insert(ROOT, local.to_vec());
        let mut incoming = self.push(&outgoing, tag)?;
        if self.rank() != ROOT {
            return Ok(None);
        }
        Ok(Some(
            (0..self.size())
                .map(|r| incoming.remove(&r).unwrap_or_default())
                .collect(),
        ))
    }

    /// Inverse of [`Exchanger::gather_to_root`]: [`ROOT`] supplies one
    /// vector per rank, every rank receives its own. `parts` is ignored
    /// off the root.
    pub fn scatter_from_root(
        &self,
        parts: Option<Vec<Vec<u64>>>,
        tag: CommTag,
    ) -> Result<Vec<u64>, MeshGenError> {
        let mut outgoing = KeyedIds::new();
        if self.rank() == ROOT {
            for (r, part) in parts.unwrap_or_default().into_iter().enumerate() {
                outgoing.insert(r, part);
            }
        }
        let mut incoming = self.push(&outgoing, tag)?;
        Ok(incoming.remove(&ROOT).unwrap_or_default())
    }
}
