//! Bindings for the Safe contracts the service talks to.

use alloy_sol_types::sol;

sol! {
    /// Safe proxy factory (v1.3.0 layout)
    #[sol(rpc)]
    interface IProxyFactory {
        function proxyCreationCode() external pure returns (bytes memory);

        function createProxyWithNonce(
            address singleton,
            bytes memory initializer,
            uint256 saltNonce
        ) external returns (address proxy);
    }

    /// Safe singleton, the functions used through a deployed proxy
    #[sol(rpc)]
    interface ISafe {
        function setup(
            address[] calldata owners,
            uint256 threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;

        function execTransaction(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address refundReceiver,
            bytes memory signatures
        ) external payable returns (bool success);
    }
}
