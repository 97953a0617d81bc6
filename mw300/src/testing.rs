//! Host stand-ins for memory-mapped hardware.


use crate::regs::StaticRef;


/// Allocates a zeroed register block in RAM that lives until the test process exits.
pub(crate) fn ram_block<T: 'static>() -> StaticRef<T> {
    let block: &'static mut T = Box::leak(Box::new(unsafe { core::mem::zeroed::<T>() }));
    unsafe { StaticRef::new(block as *const T) }
}


/// Sets the raw contents of a register, including ones the drivers may only read.
pub(crate) fn poke<R>(register: &R, value: u32) {
    assert_eq!(core::mem::size_of::<R>(), 4);
    unsafe { (register as *const R as *mut u32).write_volatile(value) }
}


/// Returns the raw contents of a register, including ones the drivers may only write.
pub(crate) fn peek<R>(register: &R) -> u32 {
    assert_eq!(core::mem::size_of::<R>(), 4);
    unsafe { (register as *const R as *const u32).read_volatile() }
}
