//! Minimal ELF64 shared objects for tests.
//!
//! The image has an ELF header, a PT_LOAD covering the whole file at
//! vaddr 0, a PT_DYNAMIC, a .dynstr table and the dynamic array. There
//! are no section headers, symbols or code.

const PT_LOAD: u32 = 1;
const PT_DYNAMIC: u32 = 2;

const DT_NULL: u64 = 0;
const DT_NEEDED: u64 = 1;
const DT_STRTAB: u64 = 5;
const DT_STRSZ: u64 = 10;
const DT_SONAME: u64 = 14;
const DT_RPATH: u64 = 15;
const DT_RUNPATH: u64 = 29;

const EHDR_SIZE: usize = 64;
const PHDR_SIZE: usize = 56;
const DYNSTR_OFF: usize = EHDR_SIZE + 2 * PHDR_SIZE;

#[derive(Default)]
pub struct ElfSpec<'a> {
    pub soname: Option<&'a str>,
    pub needed: &'a [&'a str],
    pub rpath: Option<&'a str>,
    pub runpath: Option<&'a str>,
}

pub fn build_so(spec: &ElfSpec) -> Vec<u8> {
    let mut dynstr = vec![0u8];
    let mut dyns: Vec<(u64, u64)> = Vec::new();
    let mut add = |tag: u64, s: &str| {
        dyns.push((tag, dynstr.len() as u64));
        dynstr.extend_from_slice(s.as_bytes());
        dynstr.push(0);
    };
    for name in spec.needed {
        add(DT_NEEDED, name);
    }
    if let Some(s) = spec.soname {
        add(DT_SONAME, s);
    }
    if let Some(s) = spec.rpath {
        add(DT_RPATH, s);
    }
    if let Some(s) = spec.runpath {
        add(DT_RUNPATH, s);
    }
    dyns.push((DT_STRTAB, DYNSTR_OFF as u64));
    dyns.push((DT_STRSZ, dynstr.len() as u64));
    dyns.push((DT_NULL, 0));

    let dyn_off = (DYNSTR_OFF + dynstr.len() + 7) & !7;
    let dyn_size = dyns.len() * 16;
    let total = dyn_off + dyn_size;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&3u16.to_le_bytes()); // ET_DYN
    out.extend_from_slice(&62u16.to_le_bytes()); // EM_X86_64
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes()); // e_entry
    out.extend_from_slice(&(EHDR_SIZE as u64).to_le_bytes()); // e_phoff
    out.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
    out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    for v in [EHDR_SIZE as u16, PHDR_SIZE as u16, 2, 64, 0, 0] {
        out.extend_from_slice(&v.to_le_bytes());
    }

    push_phdr(&mut out, PT_LOAD, 0, total);
    push_phdr(&mut out, PT_DYNAMIC, dyn_off, dyn_size);

    out.extend_from_slice(&dynstr);
    out.resize(dyn_off, 0);
    for (tag, val) in dyns {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&val.to_le_bytes());
    }
    assert_eq!(out.len(), total);
    out
}

fn push_phdr(out: &mut Vec<u8>, p_type: u32, offset: usize, size: usize) {
    out.extend_from_slice(&p_type.to_le_bytes());
    out.extend_from_slice(&4u32.to_le_bytes()); // PF_R
    out.extend_from_slice(&(offset as u64).to_le_bytes()); // p_offset
    out.extend_from_slice(&(offset as u64).to_le_bytes()); // p_vaddr
    out.extend_from_slice(&(offset as u64).to_le_bytes()); // p_paddr
    out.extend_from_slice(&(size as u64).to_le_bytes()); // p_filesz
    out.extend_from_slice(&(size as u64).to_le_bytes()); // p_memsz
    out.extend_from_slice(&8u64.to_le_bytes()); // p_align
}
