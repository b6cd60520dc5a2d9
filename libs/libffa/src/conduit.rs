use super::Registers;

/// Mechanism used to reach the SPMC: one privileged call, 8 words in, 8 words out.
pub trait Conduit {
    fn call(&mut self, args: Registers) -> Registers;
}

impl<C: Conduit + ?Sized> Conduit for &mut C {
    fn call(&mut self, args: Registers) -> Registers {
        (**self).call(args)
    }
}

/// S-EL0 partitions trap into the SPMC with SVC.
#[cfg(target_arch = "aarch64")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Svc;

#[cfg(target_arch = "aarch64")]
impl Conduit for Svc {
    fn call(&mut self, args: Registers) -> Registers {
        let mut regs = args;

        // x8..x17 are not preserved by SMCCC v1.0 implementations
        unsafe {
            core::arch::asm!(
                "svc #0",
                inout("x0") regs[0],
                inout("x1") regs[1],
                inout("x2") regs[2],
                inout("x3") regs[3],
                inout("x4") regs[4],
                inout("x5") regs[5],
                inout("x6") regs[6],
                inout("x7") regs[7],
                lateout("x8") _,
                lateout("x9") _,
                lateout("x10") _,
                lateout("x11") _,
                lateout("x12") _,
                lateout("x13") _,
                lateout("x14") _,
                lateout("x15") _,
                lateout("x16") _,
                lateout("x17") _,
                options(nostack),
            );
        }

        regs
    }
}
