/// Fixed-size container for picked-up items.
#[derive(Debug, Clone)]
pub struct Inventory<T> {
    slots: usize,
    items: Vec<T>,
}

impl<T: Copy> Inventory<T> {
    pub fn new(slots: usize) -> Self {
        Self {
            slots,
            items: Vec::with_capacity(slots),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.slots
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Accept items in order until the inventory is full. Returns the ones
    /// that were taken. Once full, `items` is not pulled any further.
    pub fn pickup(&mut self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let mut items = items.into_iter();
        let mut accepted = Vec::new();
        while !self.is_full() {
            let Some(item) = items.next() else {
                break;
            };
            self.items.push(item);
            accepted.push(item);
        }
        accepted
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
