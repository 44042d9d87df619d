use std::cell::Cell;
use std::rc::Rc;

/// Single-writer, multi-reader value cell. Readers always see the latest write,
/// and writing never triggers any recomputation.
pub fn live_value<T: Copy>(initial: T) -> (LiveWriter<T>, LiveReader<T>) {
    let cell = Rc::new(Cell::new(initial));
    (LiveWriter(Rc::clone(&cell)), LiveReader(cell))
}

/// The only handle that can change the value. Deliberately not `Clone`.
#[derive(Debug)]
pub struct LiveWriter<T: Copy>(Rc<Cell<T>>);

impl<T: Copy> LiveWriter<T> {
    pub fn set(&self, value: T) {
        self.0.set(value);
    }

    pub fn reader(&self) -> LiveReader<T> {
        LiveReader(Rc::clone(&self.0))
    }
}

#[derive(Debug, Clone)]
pub struct LiveReader<T: Copy>(Rc<Cell<T>>);

impl<T: Copy> LiveReader<T> {
    pub fn get(&self) -> T {
        self.0.get()
    }
}
