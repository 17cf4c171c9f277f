// patch:Get / patch:Set / patch:Put handling on top of the registry.
//
// Messages are atom objects whose otype names the verb:
//
//   Get { subject?, property? }        -> reply Set (one property) or Put (all)
//   Set { subject?, property, value }  -> stage `value` for `property`
//   Put { subject?, body: Object }     -> stage every key/value pair of `body`
//
// A message naming another subject is not for us and is ignored.

use crate::Core::atom::{parse_atom, ObjectView};
use crate::Core::error::{PropsError, Result};
use crate::Core::urid::Urid;
use crate::Props::registry::{PropState, Props};

use tracing::{debug, warn};

/// Outcome of [`Props::handle_patch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchResponse {
    /// Not addressed to this registry, or not a verb it handles.
    Ignored,
    /// Properties staged for import, in message order.
    Applied(Vec<Urid>),
    /// Forged answer to a `patch:Get`.
    Reply(Vec<u8>),
}

impl<S: PropState> Props<S> {
    /// Handle one incoming patch message.
    pub fn handle_patch(&self, message: &[u8]) -> Result<PatchResponse> {
        let urids = *self.urids();
        let atom = parse_atom(message)?;
        if atom.type_urid != urids.object.get() {
            return Err(PropsError::Malformed("patch message is not an object"));
        }
        let object = atom.object()?;

        if let Some(subject) = object.get(urids.patch_subject.get())? {
            if subject.as_urid() != Some(self.subject()) {
                debug!(subject = ?subject.as_urid(), "patch for another subject ignored");
                return Ok(PatchResponse::Ignored);
            }
        }

        let verb = object.otype;
        if verb == urids.patch_get.get() {
            self.patch_get(&object)
        } else if verb == urids.patch_set.get() {
            self.patch_set(&object)
        } else if verb == urids.patch_put.get() {
            self.patch_put(&object)
        } else {
            Ok(PatchResponse::Ignored)
        }
    }

    fn patch_property(&self, object: &ObjectView<'_>) -> Result<Option<Urid>> {
        match object.get(self.urids().patch_property.get())? {
            Some(atom) => atom
                .as_urid()
                .map(Some)
                .ok_or(PropsError::Malformed("patch:property is not a URID")),
            None => Ok(None),
        }
    }

    fn patch_get(&self, object: &ObjectView<'_>) -> Result<PatchResponse> {
        match self.patch_property(object)? {
            Some(property) => {
                let value = self.get(property)?;
                Ok(PatchResponse::Reply(self.forge_set(property, &value)))
            }
            None => Ok(PatchResponse::Reply(self.forge_put(&self.get_all()))),
        }
    }

    fn patch_set(&self, object: &ObjectView<'_>) -> Result<PatchResponse> {
        let property = self
            .patch_property(object)?
            .ok_or(PropsError::Malformed("patch:Set without patch:property"))?;
        let value = object
            .get(self.urids().patch_value.get())?
            .ok_or(PropsError::Malformed("patch:Set without patch:value"))?;

        let mut raw = Vec::with_capacity(value.total_size());
        value.write_into(&mut raw);

        self.accept_for_import(property, &raw)?;
        Ok(PatchResponse::Applied(vec![property]))
    }

    fn patch_put(&self, object: &ObjectView<'_>) -> Result<PatchResponse> {
        let urids = self.urids();
        let body = object
            .get(urids.patch_body.get())?
            .ok_or(PropsError::Malformed("patch:Put without patch:body"))?;
        if body.type_urid != urids.object.get() {
            return Err(PropsError::Malformed("patch:body is not an object"));
        }

        let mut applied = Vec::new();
        let mut raw = Vec::new();
        for prop in body.object()?.iter() {
            let (key, value) = prop?;
            let Some(property) = Urid::new(key) else {
                warn!("patch:Put entry with a zero key skipped");
                continue;
            };

            raw.clear();
            value.write_into(&mut raw);

            match self.accept_for_import(property, &raw) {
                Ok(()) => applied.push(property),
                Err(PropsError::TypeMismatch { expected, found }) => warn!(
                    property = %property,
                    expected = ?self.value_type_of(expected),
                    found = ?self.value_type_of(found),
                    "patch:Put entry has the wrong type"
                ),
                Err(e) => warn!(property = %property, error = %e, "patch:Put entry rejected"),
            }
        }
        Ok(PatchResponse::Applied(applied))
    }

    /// `patch:Set` announcing `value` for `property`, from this subject.
    pub fn forge_set(&self, property: Urid, value: &[u8]) -> Vec<u8> {
        let urids = *self.urids();
        let subject = self.subject();
        let mut forge = self.forge();
        forge.object(0, urids.patch_set.get(), |f| {
            f.key(urids.patch_subject).urid(subject);
            f.key(urids.patch_property).urid(property);
            f.key(urids.patch_value).raw(value);
        });
        forge.finish()
    }

    /// `patch:Put` carrying every `(property, value)` pair in its body.
    pub fn forge_put(&self, values: &[(Urid, Vec<u8>)]) -> Vec<u8> {
        let urids = *self.urids();
        let subject = self.subject();
        let mut forge = self.forge();
        forge.object(0, urids.patch_put.get(), |f| {
            f.key(urids.patch_subject).urid(subject);
            f.key(urids.patch_body).object(0, 0, |f| {
                for (property, value) in values {
                    f.key(*property).raw(value);
                }
            });
        });
        forge.finish()
    }

    /// Drain every pending export as a `patch:Set` notification.
    pub fn collect_notifications(&self) -> Vec<Vec<u8>> {
        self.drain_all_for_export()
            .into_iter()
            .filter(|(property, _)| {
                self.resolve(*property)
                    .map_or(false, |slot| slot.access().is_readable())
            })
            .map(|(property, value)| self.forge_set(property, &value))
            .collect()
    }
}
