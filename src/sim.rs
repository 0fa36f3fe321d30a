use log::debug;

use crate::arch::{ControlRegister, DEFAULT_MEMORY_SIZE, SP};
use crate::errors::SimError;
use crate::exec;
use crate::matrix::Tile;
use crate::memory::Ram;
use crate::program::load_bytes;
use crate::registers::Cpu;

pub use crate::exec::StepOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Halted,
    /// The iteration budget ran out before a `halt`.
    IterationLimitReached,
}

/// One simulation run: registers, memory, and the halted or faulted state.
#[derive(Clone)]
pub struct Core {
    cpu: Cpu,
    mem: Ram,
    cr: ControlRegister,
    halted: bool,
    /// The fault that ended the run, replayed by every later `step`.
    fault: Option<SimError>,
    cycles: usize,
}

impl Core {
    /// Loads `image` at address 0 of a memory of `DEFAULT_MEMORY_SIZE` bytes
    /// (or the image length, if larger).
    pub fn new(image: &[u8], cr: ControlRegister) -> Self {
        Self::with_memory_size(image, cr, DEFAULT_MEMORY_SIZE)
    }

    pub fn with_memory_size(image: &[u8], cr: ControlRegister, size: usize) -> Self {
        let mut core = Core {
            cpu: Cpu::default(),
            mem: Ram::from_image(image, size),
            cr,
            halted: false,
            fault: None,
            cycles: 0,
        };
        core.reset();
        core
    }

    /// Replaces memory with `image` (same size) and restarts from the control register.
    /// An image larger than memory is rejected and the core is left untouched.
    pub fn load(&mut self, image: &[u8]) -> Result<(), SimError> {
        let mut mem = Ram::new(self.mem.len());
        load_bytes(&mut mem, 0, image)?;
        self.mem = mem;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.cpu = Cpu::default();
        self.cpu.pc = self.cr.start_address;
        self.cpu.x[SP as usize] = self.cr.stack_pointer as i32;
        self.halted = false;
        self.fault = None;
        self.cycles = 0;
    }

    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        if self.halted {
            return Ok(StepOutcome::Halted);
        }
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        let outcome = match exec::step(&mut self.cpu, &mut self.mem) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("fault at pc=0x{:08x} after {} cycles: {e}", self.cpu.pc, self.cycles);
                self.fault = Some(e.clone());
                return Err(e);
            }
        };
        self.cycles += 1;
        if outcome == StepOutcome::Halted {
            debug!("halted at pc=0x{:08x} after {} cycles", self.cpu.pc, self.cycles);
            self.halted = true;
        }
        Ok(outcome)
    }

    /// Steps until `halt` or until `max_iterations` cycles have executed.
    pub fn run(&mut self, max_iterations: usize) -> Result<RunOutcome, SimError> {
        for _ in 0..max_iterations {
            if self.step()? == StepOutcome::Halted {
                return Ok(RunOutcome::Halted);
            }
        }
        if self.halted {
            return Ok(RunOutcome::Halted);
        }
        debug!("iteration limit {max_iterations} reached at pc=0x{:08x}", self.cpu.pc);
        Ok(RunOutcome::IterationLimitReached)
    }

    pub fn pc(&self) -> u32 {
        self.cpu.pc
    }

    pub fn scalar_regs(&self) -> &[i32] {
        &self.cpu.x
    }

    pub fn matrix_regs(&self) -> &[Tile] {
        &self.cpu.m
    }

    pub fn memory(&self) -> &[u8] {
        self.mem.as_bytes()
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn fault(&self) -> Option<&SimError> {
        self.fault.as_ref()
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.mem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::DATA_START;
    use crate::asm::assemble_program;
    use crate::memory::Bus;
    use crate::program::image_from_words;

    fn core_for(src: &str) -> Core {
        let prog = assemble_program(src).expect("assemble");
        Core::new(&prog.image(), ControlRegister::default())
    }

    #[test]
    fn add_two_immediates() {
        let mut core = core_for("addi x1, x0, 5\naddi x2, x0, 7\nadd x3, x1, x2\nhalt");
        assert_eq!(core.run(100), Ok(RunOutcome::Halted));
        assert_eq!(core.scalar_regs()[3], 12);
        assert!(core.is_halted());
        assert_eq!(core.cycles(), 4);
    }

    #[test]
    fn control_register_seeds_pc_and_sp() {
        let core = Core::new(&[], ControlRegister::new(0x40, 0x8000));
        assert_eq!(core.pc(), 0x40);
        assert_eq!(core.scalar_regs()[2], 0x8000);
    }

    #[test]
    fn li_large_immediate() {
        let mut core = core_for("li x5, 5000\nli x6, -1\nli x7, 0x7FFFFFFF\nli x8, -2048\nhalt");
        assert_eq!(core.run(100), Ok(RunOutcome::Halted));
        assert_eq!(core.scalar_regs()[5], 5000);
        assert_eq!(core.scalar_regs()[6], -1);
        assert_eq!(core.scalar_regs()[7], i32::MAX);
        assert_eq!(core.scalar_regs()[8], -2048);
    }

    #[test]
    fn self_loop_hits_iteration_limit() {
        let mut core = core_for("addi x1, x1, 1\nloop: addi x5, x5, 1\nbeq x0, x0, loop");
        assert_eq!(core.run(100), Ok(RunOutcome::IterationLimitReached));
        assert_eq!(core.cycles(), 100);
        assert_eq!(core.scalar_regs()[1], 1);
        // 99 cycles after the first alternate addi/beq
        assert_eq!(core.scalar_regs()[5], 50);
        assert_eq!(core.scalar_regs()[2], 64 * 1024);
        assert!(!core.is_halted());
    }

    #[test]
    fn branch_to_self_without_halt() {
        let mut core = core_for("spin: beq x0, x0, spin");
        assert_eq!(core.run(100), Ok(RunOutcome::IterationLimitReached));
        assert_eq!(core.cycles(), 100);
        assert_eq!(core.pc(), 0);
    }

    #[test]
    fn misaligned_load_aborts_run() {
        let mut core = core_for("lw x1, 1(x0)\nhalt");
        assert_eq!(core.run(10), Err(SimError::AlignmentFault { addr: 1 }));
        assert!(!core.is_halted());
        assert_eq!(core.fault(), Some(&SimError::AlignmentFault { addr: 1 }));
    }

    #[test]
    fn fault_is_terminal_until_reload() {
        let mut core = core_for("addi x5, x0, 1\nlw x1, 2(x0)\nhalt");
        assert_eq!(core.run(10), Err(SimError::AlignmentFault { addr: 2 }));
        assert_eq!((core.pc(), core.cycles()), (4, 1));
        // the faulting instruction is not executed again
        assert_eq!(core.step(), Err(SimError::AlignmentFault { addr: 2 }));
        assert_eq!(core.run(10), Err(SimError::AlignmentFault { addr: 2 }));
        assert_eq!((core.pc(), core.cycles()), (4, 1));

        let prog = assemble_program("halt").unwrap();
        core.load(&prog.image()).unwrap();
        assert_eq!(core.fault(), None);
        assert_eq!(core.run(10), Ok(RunOutcome::Halted));
    }

    #[test]
    fn step_after_halt_does_nothing() {
        let mut core = core_for("halt");
        assert_eq!(core.step(), Ok(StepOutcome::Halted));
        assert_eq!(core.step(), Ok(StepOutcome::Halted));
        assert_eq!(core.cycles(), 1);
        assert_eq!(core.run(5), Ok(RunOutcome::Halted));
    }

    #[test]
    fn push_pop_and_calls() {
        let src = "
            li a0, 21
            call double
            push a0
            pop s1
            halt
        double:
            add a0, a0, a0
            ret
        ";
        let mut core = core_for(src);
        assert_eq!(core.run(100), Ok(RunOutcome::Halted));
        assert_eq!(core.scalar_regs()[9], 42);
        assert_eq!(core.scalar_regs()[2], 64 * 1024);
        assert_eq!(&core.memory()[0xFFFC..0x10000], &42i32.to_le_bytes());
    }

    #[test]
    fn loop_sums_data_words() {
        let src = "
            .data
        vals: .word 1, 2, 3, 4, -5
        out:  .word 0
            .text
            la t0, vals
            li t1, 5
            li t2, 0
        next:
            lw t3, 0(t0)
            add t2, t2, t3
            addi t0, t0, 4
            addi t1, t1, -1
            bnez t1, next
            la t0, out
            sw t2, 0(t0)
            halt
        ";
        let mut core = core_for(src);
        assert_eq!(core.run(1000), Ok(RunOutcome::Halted));
        assert_eq!(core.scalar_regs()[7], 5);
        let out = DATA_START as usize + 20;
        assert_eq!(&core.memory()[out..out + 4], &5i32.to_le_bytes());
    }

    #[test]
    fn gemm_over_loaded_tiles() {
        let rows = [
            [1.0, 0.5, 0.0, 0.0],
            [0.0, 1.0, 0.5, 0.0],
            [0.0, 0.0, 1.0, 0.5],
            [0.25, 0.0, 0.0, 1.0],
        ];
        let tile = Tile::from_f32(rows);
        let words = crate::asm::assemble(
            "addi x1, x0, 512\nld.m m1, x0, 0(x1)\ngemm m3, m1, m1, m1\nst.m m3, x0, 32(x1)\nhalt",
        )
        .expect("assemble");
        let mut image = image_from_words(&words);
        image.resize(DATA_START as usize, 0);
        image.extend_from_slice(&tile.to_bytes());

        let mut core = Core::new(&image, ControlRegister::default());
        assert_eq!(core.run(100), Ok(RunOutcome::Halted));
        assert_eq!(core.matrix_regs()[1], tile);

        let got = core.matrix_regs()[3].to_f32();
        for i in 0..4 {
            for j in 0..4 {
                let want: f32 = (0..4).map(|k| rows[i][k] * rows[k][j]).sum::<f32>() + rows[i][j];
                assert!((got[i][j] - want).abs() < 1e-2, "({i},{j}) {} vs {want}", got[i][j]);
            }
        }
        let stored = core.ram_mut().load32(DATA_START + 32).unwrap();
        assert_eq!(stored, core.matrix_regs()[3].row_word(0, 0));
    }

    #[test]
    fn load_resets_state() {
        let mut core = core_for("addi x1, x0, 9\nhalt");
        core.run(10).unwrap();
        let prog = assemble_program("addi x4, x0, 3\nhalt").unwrap();
        core.load(&prog.image()).unwrap();
        assert_eq!(core.scalar_regs()[1], 0);
        assert!(!core.is_halted());
        core.run(10).unwrap();
        assert_eq!(core.scalar_regs()[4], 3);
    }

    #[test]
    fn oversized_image_is_rejected_by_load() {
        let mut core = Core::with_memory_size(&[], ControlRegister::default(), 16);
        let image = vec![0u8; 20];
        assert_eq!(core.load(&image), Err(SimError::OutOfBounds { addr: 16, len: 1 }));
        assert_eq!(core.memory().len(), 16);
    }
}
