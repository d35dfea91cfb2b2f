use rv32i_toolchain::assembler::assemble;
use rv32i_toolchain::hart::memory::Memory;
use rv32i_toolchain::hart::Hart;

fn run_program(src: &str, max_cycles: u64) -> Hart {
    let words = assemble(src).unwrap();
    let mut hart = Hart::new(words, Memory::default());
    hart.run(max_cycles).unwrap();
    hart
}

#[test]
fn shift_by_zero_and_by_31() {
    let hart = run_program(
        "addi a0, zero, -1\n\
         slli a1, a0, 0\n\
         slli a2, a0, 31\n\
         srli a3, a0, 31\n\
         ebreak\n",
        100,
    );
    assert_eq!(hart.register(11), 0xffff_ffff);
    assert_eq!(hart.register(12), 0x8000_0000);
    assert_eq!(hart.register(13), 1);
}

#[test]
fn arithmetic_right_shift_preserves_sign() {
    let hart = run_program("addi a0, zero, -2\nsrai a1, a0, 1\nebreak\n", 100);
    assert_eq!(hart.register(11) as i32, -1);
}

#[test]
fn ret_after_jal_returns_to_instruction_following_the_call() {
    let src = "jal ra, func\n\
               li a0, 2\n\
               ebreak\n\
               func:\n\
               li a0, 1\n\
               ret\n";
    let hart = run_program(src, 100);
    assert_eq!(hart.register(10), 2);
}

#[test]
fn cycle_cap_halts_driver_loop() {
    let words = assemble("loop:\n  jal x0, loop\n").unwrap();
    let mut hart = Hart::new(words, Memory::default());
    let cycles = hart.run(100).unwrap();
    assert_eq!(cycles, 100);
    assert!(!hart.halted());
}

#[test]
fn signed_branch_taken_and_not_taken() {
    let taken = run_program(
        "addi x1, zero, -1\naddi x2, zero, 1\nblt x1, x2, yes\naddi a0, zero, 0\nebreak\nyes:\naddi a0, zero, 1\nebreak\n",
        100,
    );
    assert_eq!(taken.register(10), 1);

    let not_taken = run_program(
        "addi x1, zero, -1\naddi x2, zero, 1\nblt x2, x1, yes\naddi a0, zero, 0\nebreak\nyes:\naddi a0, zero, 1\nebreak\n",
        100,
    );
    assert_eq!(not_taken.register(10), 0);
}

#[test]
fn byte_store_sign_and_zero_extension() {
    let hart = run_program(
        "addi a0, zero, -1\nsb a0, 0(zero)\nlb a1, 0(zero)\nlbu a2, 0(zero)\nebreak\n",
        100,
    );
    assert_eq!(hart.register(11) as i32, -1);
    assert_eq!(hart.register(12), 0xff);
}
