//! End-to-end test for the listener: a fake JIT object with a mix of good
//! and unresolvable symbols goes in, and the resulting dump file is read
//! back with the `linux-perf-data` jitdump parser.
//!
//! Kept as a single test because it configures the dump location through the
//! process-wide `JITDUMPDIR` environment variable.

use std::collections::HashMap;
use std::fs::File;

use jitdump_writer::{
    elf_machine, DebugInfoProvider, EmittedObject, LineEntry, PerfJitDumpListener, SymbolError,
    SymbolInfo, SymbolKind, JITDUMP_DIR_ENV, JITDUMP_VERSION, JIT_LANG, PERF_ELF_PREAMBLE_SIZE,
};
use linux_perf_data::jitdump::{JitDumpReader, JitDumpRecord};

static CODE_A: [u8; 8] = [0x55, 0x48, 0x89, 0xe5, 0x31, 0xc0, 0x5d, 0xc3];
static CODE_B: [u8; 4] = [0x31, 0xc0, 0x90, 0xc3];
static CODE_C: [u8; 6] = [0x48, 0xff, 0xc7, 0x48, 0x89, 0xf8];

struct TestObject {
    symbols: Vec<SymbolInfo>,
}

impl EmittedObject for TestObject {
    fn symbols(&self) -> Vec<SymbolInfo> {
        self.symbols.clone()
    }
}

struct TestDebugInfo {
    tables: HashMap<u64, Vec<LineEntry>>,
}

impl DebugInfoProvider for TestDebugInfo {
    fn line_table(&self, code_addr: u64, _code_size: u64) -> Vec<LineEntry> {
        self.tables.get(&code_addr).cloned().unwrap_or_default()
    }
}

fn function_symbol(name: &str, code: &'static [u8]) -> SymbolInfo {
    SymbolInfo {
        kind: Ok(SymbolKind::Function),
        name: Ok(name.to_string()),
        address: Ok(code.as_ptr() as u64),
        size: code.len() as u64,
    }
}

fn line_table_for(code: &'static [u8], file_path: &str) -> Vec<LineEntry> {
    let addr = code.as_ptr() as u64;
    vec![
        LineEntry {
            address: addr,
            line: 1,
            column: 0,
            file_path: file_path.to_string(),
        },
        LineEntry {
            address: addr + 4,
            line: 2,
            column: 3,
            file_path: file_path.to_string(),
        },
    ]
}

#[test]
fn listener_writes_paired_records_for_emitted_objects() {
    let base = tempfile::tempdir().unwrap();
    std::env::set_var(JITDUMP_DIR_ENV, base.path());

    let listener = PerfJitDumpListener::new();
    assert!(listener.is_active());

    // `$JITDUMPDIR/.debug/jit/<lang>-jit-<YYYYMMDD>-<suffix>/jit-<pid>.dump`
    let dump_path = listener.dump_path().unwrap();
    assert_eq!(
        dump_path.file_name().unwrap().to_str().unwrap(),
        format!("jit-{}.dump", std::process::id())
    );
    let dump_dir = dump_path.parent().unwrap();
    let date = chrono::Local::now().format("%Y%m%d");
    assert!(dump_dir
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with(&format!("{JIT_LANG}-jit-{date}-")));
    assert_eq!(dump_dir.parent().unwrap(), base.path().join(".debug/jit"));

    // First object: two real functions (one with a line table), plus a
    // zero-sized function and a batch of unresolvable symbols which must all
    // be skipped without aborting the object.
    let object = TestObject {
        symbols: vec![
            function_symbol("func_a", &CODE_A),
            function_symbol("func_b", &CODE_B),
            SymbolInfo {
                kind: Ok(SymbolKind::Function),
                name: Ok("func_empty".to_string()),
                address: Ok(CODE_A.as_ptr() as u64),
                size: 0,
            },
            SymbolInfo {
                kind: Ok(SymbolKind::Data),
                name: Ok("some_global".to_string()),
                address: Ok(CODE_A.as_ptr() as u64),
                size: 8,
            },
            SymbolInfo {
                kind: Err(SymbolError("type")),
                name: Ok("unknown_kind".to_string()),
                address: Ok(CODE_A.as_ptr() as u64),
                size: 8,
            },
            SymbolInfo {
                kind: Ok(SymbolKind::Function),
                name: Err(SymbolError("name")),
                address: Ok(CODE_A.as_ptr() as u64),
                size: 8,
            },
            SymbolInfo {
                kind: Ok(SymbolKind::Function),
                name: Ok("no_address".to_string()),
                address: Err(SymbolError("address")),
                size: 8,
            },
        ],
    };
    let debug_info = TestDebugInfo {
        tables: HashMap::from([(
            CODE_A.as_ptr() as u64,
            line_table_for(&CODE_A, "/work/src/a.src"),
        )]),
    };
    listener.notify_object_emitted(&object, &debug_info);

    // Second object, to check that code indices keep increasing across
    // notifications.
    let object = TestObject {
        symbols: vec![function_symbol("func_c", &CODE_C)],
    };
    let debug_info = TestDebugInfo {
        tables: HashMap::from([(
            CODE_C.as_ptr() as u64,
            line_table_for(&CODE_C, "/work/src/c.src"),
        )]),
    };
    listener.notify_object_emitted(&object, &debug_info);
    listener.notify_object_freed(&object);

    let file = File::open(&dump_path).unwrap();
    let mut reader = JitDumpReader::new(file).unwrap();
    let header = reader.header().clone();
    assert_eq!(header.version, JITDUMP_VERSION);
    assert_eq!(header.pid, std::process::id());
    assert_eq!(header.elf_machine_arch, elf_machine().unwrap());
    assert!(header.timestamp > 0);

    let mut records = Vec::new();
    let mut timestamps = Vec::new();
    while let Some(raw) = reader.next_record().unwrap() {
        timestamps.push(raw.timestamp);
        records.push(match raw.parse().unwrap() {
            JitDumpRecord::CodeDebugInfo(r) => {
                let entries = r
                    .entries
                    .iter()
                    .map(|e| {
                        (
                            e.code_addr,
                            e.line,
                            e.column,
                            e.file_path.as_slice().to_vec(),
                        )
                    })
                    .collect::<Vec<_>>();
                (String::from("debug"), r.code_addr, 0, entries)
            }
            JitDumpRecord::CodeLoad(r) => {
                assert_eq!(r.pid, std::process::id());
                assert_ne!(r.tid, 0);
                assert_eq!(r.vma, 0);
                let name = String::from_utf8(r.function_name.as_slice().to_vec()).unwrap();
                let expected_code: &[u8] = match name.as_str() {
                    "func_a" => &CODE_A,
                    "func_b" => &CODE_B,
                    "func_c" => &CODE_C,
                    other => panic!("unexpected function: {other}"),
                };
                assert_eq!(r.code_bytes.as_slice().as_ref(), expected_code);
                (name, r.code_addr, r.code_index, vec![])
            }
            other => panic!("unexpected record: {other:?}"),
        });
    }

    let addr_a = CODE_A.as_ptr() as u64;
    let addr_b = CODE_B.as_ptr() as u64;
    let addr_c = CODE_C.as_ptr() as u64;

    // Exactly one (debug, load) pair per function with a line table, debug
    // immediately preceding its load; func_b has no line table and gets a
    // bare load; the rest of the symbols produce nothing.
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].0, "debug");
    assert_eq!(records[0].1, addr_a);
    assert_eq!((&*records[1].0, records[1].1), ("func_a", addr_a));
    assert_eq!((&*records[2].0, records[2].1), ("func_b", addr_b));
    assert_eq!(records[3].0, "debug");
    assert_eq!(records[3].1, addr_c);
    assert_eq!((&*records[4].0, records[4].1), ("func_c", addr_c));

    // Code indices start at 1 and strictly increase across notifications.
    assert_eq!(records[1].2, 1);
    assert_eq!(records[2].2, 2);
    assert_eq!(records[4].2, 3);

    // Debug entries carry the synthetic ELF header adjustment.
    let entries = &records[0].3;
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0],
        (
            addr_a + PERF_ELF_PREAMBLE_SIZE,
            1,
            0,
            b"/work/src/a.src".to_vec()
        )
    );
    assert_eq!(
        entries[1],
        (
            addr_a + 4 + PERF_ELF_PREAMBLE_SIZE,
            2,
            3,
            b"/work/src/a.src".to_vec()
        )
    );

    // Record timestamps are monotonic within the file.
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}
