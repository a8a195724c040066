use super::*;

// two leaves under one separator:
//
//        2   rows 4..5  cols 4..5
//       / \
//      0   1
//  rows 0..2  rows 2..4
//  cols 0..2  cols 2..4
fn two_leaf_tree() -> BlockTree {
    BlockTree::new(vec![2, 2, NO_BLOCK], vec![0, 2, 4, 5], vec![0, 2, 4, 5]).unwrap()
}

#[test]
fn test_single_block() {
    let tree = BlockTree::single(3, 7);
    assert_eq!(tree.nblocks(), 1);
    assert_eq!(tree.root(), 0);
    assert!(tree.is_leaf(0));
    assert_eq!(tree.parent(0), None);
    assert_eq!(tree.subtree_rows(0), 0..3);
    assert_eq!(tree.subtree_cols(0), 0..7);
}

#[test]
fn test_two_leaf_tree() {
    let tree = two_leaf_tree();
    assert_eq!(tree.kids(2), &[0, 1]);
    assert_eq!(tree.parent(0), Some(2));
    assert_eq!(tree.depth(0), 1);
    assert_eq!(tree.depth(2), 0);
    assert_eq!(tree.leftdesc(1), 1);
    assert_eq!(tree.leftdesc(2), 0);
    assert_eq!(tree.subtree_rows(1), 2..4);
    assert_eq!(tree.subtree_rows(2), 0..5);
    assert_eq!(tree.own_rows(2), 4..5);
    assert_eq!(tree.block_of_row(3), 1);
    assert_eq!(tree.block_of_col(4), 2);
    assert!(tree.is_ancestor_or_self(2, 0));
    assert!(tree.is_ancestor_or_self(1, 1));
    assert!(!tree.is_ancestor_or_self(0, 1));
}

#[test]
fn test_empty_block_lookup() {
    // block 1 owns no rows
    let tree = BlockTree::new(vec![2, 2, NO_BLOCK], vec![0, 2, 2, 3], vec![0, 1, 2, 3]).unwrap();
    assert_eq!(tree.block_of_row(2), 2);
    assert_eq!(tree.block_of_row(1), 0);
}

#[test]
fn test_bad_trees() {
    assert_eq!(
        BlockTree::new(vec![], vec![0], vec![0]),
        Err(BlockTreeError::IncompatibleDimension)
    );
    assert_eq!(
        BlockTree::new(vec![1, NO_BLOCK], vec![0, 2, 1], vec![0, 1, 2]),
        Err(BlockTreeError::BadRanges)
    );
    assert_eq!(
        BlockTree::new(vec![NO_BLOCK, 0], vec![0, 1, 2], vec![0, 1, 2]),
        Err(BlockTreeError::BadRoot)
    );
    assert_eq!(
        BlockTree::new(vec![NO_BLOCK, NO_BLOCK], vec![0, 1, 2], vec![0, 1, 2]),
        Err(BlockTreeError::BadRoot)
    );
    // block 1 is a child of 3 but sits between the children of 2
    assert_eq!(
        BlockTree::new(
            vec![2, 3, 3, NO_BLOCK],
            vec![0, 1, 2, 3, 4],
            vec![0, 1, 2, 3, 4]
        ),
        Err(BlockTreeError::NotContiguous(2))
    );
}
