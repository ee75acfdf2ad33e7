//! Solidity interfaces for the pair/router/ERC20 calls we make.

use alloy_primitives::Address;
use alloy_sol_types::sol;

sol! {
    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    interface IUniswapV2Router02 {
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
        function swapExactETHForTokens(uint256 amountOutMin, address[] calldata path, address to, uint256 deadline)
            external payable returns (uint256[] memory amounts);
    }

    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

/// `None` unless `s` is a 20-byte hex address (checksum not enforced).
pub fn parse_address(s: &str) -> Option<Address> {
    s.trim().parse().ok()
}
