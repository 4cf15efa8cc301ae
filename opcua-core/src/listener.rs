//! Listener Manager (spec §4.5): owns the set of open listeners and the
//! connections each has accepted, so closing a listener can cascade an
//! `EP_SC_CLOSE` to every child connection. Grounded on the same
//! dense-id/free-slot shape as `connection::ConnectionTable` (itself
//! grounded on the teacher's `Endpoint`), applied one level up.

use hashbrown::HashSet;

use crate::connection::ChannelId;

pub type ListenerId = u32;

pub struct Listener {
    pub endpoint_url: String,
    pub children: HashSet<ChannelId>,
}

#[derive(Default)]
pub struct ListenerTable {
    listeners: Vec<Option<Listener>>,
    free_slots: Vec<ListenerId>,
}

impl ListenerTable {
    pub fn new() -> ListenerTable {
        ListenerTable { listeners: Vec::new(), free_slots: Vec::new() }
    }

    pub fn open(&mut self, endpoint_url: String) -> ListenerId {
        let listener = Listener { endpoint_url, children: HashSet::new() };
        if let Some(id) = self.free_slots.pop() {
            self.listeners[id as usize] = Some(listener);
            return id;
        }
        let id = self.listeners.len() as ListenerId;
        self.listeners.push(Some(listener));
        id
    }

    pub fn get(&self, id: ListenerId) -> Option<&Listener> {
        self.listeners.get(id as usize).and_then(|l| l.as_ref())
    }

    pub fn on_accepted(&mut self, id: ListenerId, channel_id: ChannelId) {
        if let Some(Some(listener)) = self.listeners.get_mut(id as usize) {
            listener.children.insert(channel_id);
        }
    }

    pub fn on_child_disconnected(&mut self, id: ListenerId, channel_id: ChannelId) {
        if let Some(Some(listener)) = self.listeners.get_mut(id as usize) {
            listener.children.remove(&channel_id);
        }
    }

    /// Close `id` and return every child connection that must now be
    /// cascaded closed (spec §4.5 "closing a listener closes its
    /// connections"). The slot is freed for reuse.
    pub fn close(&mut self, id: ListenerId) -> Vec<ChannelId> {
        let children = match self.listeners.get_mut(id as usize) {
            Some(slot @ Some(_)) => {
                let listener = slot.take().unwrap();
                listener.children.into_iter().collect()
            }
            _ => Vec::new(),
        };
        self.free_slots.push(id);
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_cascades_to_every_accepted_child() {
        let mut table = ListenerTable::new();
        let id = table.open("opc.tcp://localhost:4840".into());
        table.on_accepted(id, 0);
        table.on_accepted(id, 1);
        let mut closed = table.close(id);
        closed.sort();
        assert_eq!(closed, vec![0, 1]);
        assert!(table.get(id).is_none());
    }

    #[test]
    fn disconnected_child_is_no_longer_cascaded() {
        let mut table = ListenerTable::new();
        let id = table.open("opc.tcp://localhost:4840".into());
        table.on_accepted(id, 0);
        table.on_accepted(id, 1);
        table.on_child_disconnected(id, 0);
        let closed = table.close(id);
        assert_eq!(closed, vec![1]);
    }

    #[test]
    fn closed_slot_is_recycled() {
        let mut table = ListenerTable::new();
        let a = table.open("a".into());
        table.close(a);
        let b = table.open("b".into());
        assert_eq!(a, b);
    }
}
