use super::*;

fn small_pool() -> BufferPool {
    BufferPool::new(PoolOpts { buffer_size: 64 }).unwrap()
}

#[test]
fn acquire_hands_out_distinct_slots() {
    let mut p = small_pool();
    let a = p.acquire().unwrap();
    let b = p.acquire().unwrap();
    assert_eq!(a.index(), 0);
    assert_eq!(b.index(), 1);
    assert_eq!(a.len(), 64);
    assert!(p.is_acquired(0) && p.is_acquired(1));
}

#[test]
fn released_slot_is_reused_first() {
    let mut p = small_pool();
    let a = p.acquire().unwrap();
    let b = p.acquire().unwrap();
    p.release(a).unwrap();

    let c = p.acquire().unwrap();
    assert_eq!(c.index(), 0);

    let st = p.stats();
    assert_eq!(st.total_buffers, 2);
    assert_eq!(st.acquired_buffers, 2);
    assert_eq!(st.allocations, 2);
    assert_eq!(st.reuses, 1);

    p.release(b).unwrap();
    p.release(c).unwrap();
    assert_eq!(p.stats().acquired_buffers, 0);
}

#[test]
fn grows_past_one_bitmap_group() {
    let mut p = small_pool();
    let held: Vec<_> = (0..20).map(|_| p.acquire().unwrap()).collect();
    let indices: Vec<_> = held.iter().map(|b| b.index()).collect();
    assert_eq!(indices, (0..20).collect::<Vec<_>>());
    assert_eq!(p.bitmap.len(), 3);
}

#[test]
fn release_of_unknown_index_fails() {
    let mut p = small_pool();
    let _a = p.acquire().unwrap();
    let bogus = PooledBuffer {
        index: 9,
        data: vec![0u8; 64].into_boxed_slice(),
    };
    assert!(matches!(p.release(bogus), Err(VgirError::InvalidIndex(9))));
}

#[test]
fn release_of_unacquired_slot_fails() {
    let mut p = small_pool();
    let a = p.acquire().unwrap();
    let b = p.acquire().unwrap();
    p.release(a).unwrap();

    let forged = PooledBuffer {
        index: 0,
        data: vec![0u8; 64].into_boxed_slice(),
    };
    assert!(matches!(p.release(forged), Err(VgirError::InvalidIndex(0))));
    p.release(b).unwrap();
}

#[test]
fn rejects_undersized_buffers() {
    assert!(BufferPool::new(PoolOpts { buffer_size: 16 }).is_err());
    assert!(MemoryResourceGroup::with_opts(PoolOpts { buffer_size: 16 }).is_err());
}

#[test]
fn group_handles_share_one_pool() {
    let g = MemoryResourceGroup::new();
    let h = g.clone();
    assert!(g.ptr_eq(&h));
    assert_eq!(g.buffer_size(), DEFAULT_BUFFER_SIZE);

    let a = g.acquire().unwrap();
    assert_eq!(h.stats().acquired_buffers, 1);
    h.release(a).unwrap();
    assert_eq!(g.stats().acquired_buffers, 0);
}
