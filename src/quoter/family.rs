//! Family group editing with its invariants: one immutable holder at index 0
//! and at most one spouse.

use crate::types::{FamilyMember, MemberPayload, Relationship};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyGroup {
    members: Vec<FamilyMember>,
}

impl Default for FamilyGroup {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FamilyGroup {
    pub fn new(holder_age: Option<u8>) -> Self {
        Self {
            members: vec![FamilyMember::holder(holder_age)],
        }
    }

    /// Rebuild a group from stored members. The first holder goes to index 0;
    /// extra holders are dropped and a second spouse loses its role so the
    /// operator has to pick one.
    pub fn from_payloads(payloads: &[MemberPayload]) -> Self {
        let holder_age = payloads
            .iter()
            .find(|m| m.parentesco == Relationship::Holder)
            .map(|m| m.edad);
        let mut group = Self::new(holder_age);

        for member in payloads
            .iter()
            .filter(|m| m.parentesco != Relationship::Holder)
        {
            let role = if member.parentesco == Relationship::Spouse && group.has_spouse() {
                None
            } else {
                Some(member.parentesco)
            };
            group.members.push(FamilyMember {
                role,
                age: Some(member.edad),
            });
        }
        group
    }

    pub fn members(&self) -> &[FamilyMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn holder_age(&self) -> Option<u8> {
        self.members.first().and_then(|m| m.age)
    }

    pub fn set_holder_age(&mut self, age: Option<u8>) {
        if let Some(holder) = self.members.first_mut() {
            holder.age = age;
        }
    }

    pub fn has_spouse(&self) -> bool {
        self.members
            .iter()
            .any(|m| m.role == Some(Relationship::Spouse))
    }

    /// Append an empty row, returning its index
    pub fn add_member(&mut self) -> usize {
        self.members.push(FamilyMember::default());
        self.members.len() - 1
    }

    pub fn can_remove(&self, index: usize) -> bool {
        index > 0 && index < self.members.len()
    }

    pub fn remove_member(&mut self, index: usize) -> bool {
        if !self.can_remove(index) {
            return false;
        }
        self.members.remove(index);
        true
    }

    /// Roles selectable for a row. The holder row offers only itself; other
    /// rows lose Spouse once any other row holds it.
    pub fn role_options(&self, index: usize) -> Vec<Relationship> {
        if index == 0 {
            return vec![Relationship::Holder];
        }
        let spouse_taken = self
            .members
            .iter()
            .enumerate()
            .any(|(i, m)| i != index && m.role == Some(Relationship::Spouse));

        if spouse_taken {
            vec![Relationship::Child]
        } else {
            vec![Relationship::Spouse, Relationship::Child]
        }
    }

    pub fn is_role_editable(&self, index: usize) -> bool {
        index > 0 && index < self.members.len()
    }

    /// Returns false when the role is not among [`Self::role_options`]
    pub fn set_role(&mut self, index: usize, role: Relationship) -> bool {
        if !self.is_role_editable(index) || !self.role_options(index).contains(&role) {
            return false;
        }
        self.members[index].role = Some(role);
        true
    }

    pub fn set_age(&mut self, index: usize, age: Option<u8>) -> bool {
        match self.members.get_mut(index) {
            Some(member) => {
                member.age = age;
                true
            }
            None => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.members.iter().all(FamilyMember::is_complete)
    }

    /// Wire members, or `None` while any row is incomplete
    pub fn payloads(&self) -> Option<Vec<MemberPayload>> {
        self.members.iter().map(FamilyMember::to_payload).collect()
    }
}
